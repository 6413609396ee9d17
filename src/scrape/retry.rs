use std::{thread, time::Duration};

use crate::scrape::error::FetchError;

/// Runs `op` until it succeeds or the schedule runs out. Each entry of the
/// schedule is a wait before the next attempt, so `op` runs at most
/// `schedule.len() + 1` times. Only transient errors are retried.
pub fn with_backoff<T, F>(schedule: &[Duration], op: F) -> Result<T, FetchError>
where
    F: FnMut(usize) -> Result<T, FetchError>,
{
    with_backoff_using(schedule, thread::sleep, op)
}

pub fn with_backoff_using<T, F, S>(schedule: &[Duration], mut sleep: S, mut op: F) -> Result<T, FetchError>
where
    F: FnMut(usize) -> Result<T, FetchError>,
    S: FnMut(Duration),
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(FetchError::Transient(reason)) => match schedule.get(attempt - 1) {
                Some(wait) => {
                    log::warn!(
                        "attempt {attempt} failed ({reason}), waiting {}s before retrying",
                        wait.as_secs()
                    );
                    sleep(*wait);
                }
                None => {
                    return Err(FetchError::Exhausted {
                        attempts: attempt,
                        last: reason,
                    });
                }
            },
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Vec<Duration> {
        [30, 20, 30, 30].into_iter().map(Duration::from_secs).collect()
    }

    #[test]
    fn first_success_does_not_sleep() {
        let mut slept = Vec::new();
        let value = with_backoff_using(&schedule(), |d| slept.push(d), |_| Ok(7)).unwrap();
        assert_eq!(value, 7);
        assert!(slept.is_empty());
    }

    #[test]
    fn retries_follow_the_schedule() {
        let mut slept = Vec::new();
        let value = with_backoff_using(
            &schedule(),
            |d| slept.push(d.as_secs()),
            |attempt| {
                if attempt < 3 {
                    Err(FetchError::Transient("503".into()))
                } else {
                    Ok(attempt)
                }
            },
        )
        .unwrap();
        assert_eq!(value, 3);
        assert_eq!(slept, vec![30, 20]);
    }

    #[test]
    fn exhausted_after_schedule() {
        let mut slept = Vec::new();
        let mut calls = 0;
        let err = with_backoff_using(
            &schedule(),
            |d| slept.push(d.as_secs()),
            |_| -> Result<(), FetchError> {
                calls += 1;
                Err(FetchError::Transient("timeout".into()))
            },
        )
        .unwrap_err();

        assert_eq!(calls, 5);
        assert_eq!(slept, vec![30, 20, 30, 30]);
        assert!(matches!(err, FetchError::Exhausted { attempts: 5, .. }));
    }

    #[test]
    fn other_errors_are_not_retried() {
        let mut calls = 0;
        let err = with_backoff_using(
            &schedule(),
            |_| panic!("must not sleep"),
            |_| -> Result<(), FetchError> {
                calls += 1;
                Err(FetchError::Nonce("page".into()))
            },
        )
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, FetchError::Nonce(_)));
    }

    #[test]
    fn rejected_requests_are_not_retried() {
        let mut calls = 0;
        let err = with_backoff_using(
            &schedule(),
            |_| panic!("must not sleep"),
            |_| -> Result<(), FetchError> {
                calls += 1;
                Err(FetchError::Rejected("https://www.nova.fr answered 403".into()))
            },
        )
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, FetchError::Rejected(_)));
    }
}
