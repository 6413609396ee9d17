//! Chronological chain of playlists, used for previous/next navigation and
//! rank deltas. The chain owns the playlists; links are indices into it.

use crate::domain::{playlist::Playlist, scope::Scope, track::Track};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

#[derive(Debug, Default)]
pub struct PlaylistChain {
    playlists: Vec<Playlist>,
    links: Vec<Link>,
}

impl PlaylistChain {
    /// Orders playlists by the start of their scope (undated ones last,
    /// in input order) and links each one to its neighbours.
    pub fn link(mut playlists: Vec<Playlist>) -> Self {
        playlists.sort_by_key(|p| {
            let start = p.scope.start_date();
            (start.is_none(), start)
        });

        let mut links = vec![Link::default(); playlists.len()];
        for i in 1..playlists.len() {
            links[i].previous = Some(i - 1);
            links[i - 1].next = Some(i);
        }

        Self { playlists, links }
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Playlist> {
        self.playlists.get(index)
    }

    pub fn links(&self, index: usize) -> Option<Link> {
        self.links.get(index).copied()
    }

    pub fn previous(&self, index: usize) -> Option<&Playlist> {
        self.links(index)?.previous.and_then(|i| self.get(i))
    }

    pub fn next(&self, index: usize) -> Option<&Playlist> {
        self.links(index)?.next.and_then(|i| self.get(i))
    }

    pub fn find(&self, scope: &Scope) -> Option<usize> {
        self.playlists.iter().position(|p| &p.scope == scope)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Playlist> {
        self.playlists.iter()
    }

    /// Rank of `track` in the playlist before `index`. `None` means "not
    /// previously ranked": either the track is absent or there is no
    /// previous playlist.
    pub fn previous_rank(&self, index: usize, track: &Track) -> Option<usize> {
        self.previous(index)?.position(&track.key())
    }

    /// Positions gained since the previous playlist: positive when the
    /// track rose, negative when it fell. `None` means no delta should be
    /// shown at all.
    pub fn rank_delta(&self, index: usize, position: usize) -> Option<i64> {
        let track = self.get(index)?.tracks.get(position)?;
        let previous = self.previous_rank(index, track)?;
        Some(previous as i64 - position as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(scope: Scope, keys: &[&str]) -> Playlist {
        Playlist {
            scope,
            tracks: keys.iter().map(|k| Track::new(*k, "song")).collect(),
        }
    }

    #[test]
    fn links_follow_chronology_not_input_order() {
        let chain = PlaylistChain::link(vec![
            playlist(Scope::month(2024, 2), &[]),
            playlist(Scope::month(2023, 12), &[]),
            playlist(Scope::month(2024, 1), &[]),
        ]);

        let titles: Vec<_> = chain.iter().map(|p| p.title()).collect();
        assert_eq!(titles, vec!["December 2023", "January 2024", "February 2024"]);

        assert_eq!(chain.links(0), Some(Link { previous: None, next: Some(1) }));
        assert_eq!(chain.links(1), Some(Link { previous: Some(0), next: Some(2) }));
        assert_eq!(chain.links(2), Some(Link { previous: Some(1), next: None }));
        assert_eq!(chain.previous(1).unwrap().title(), "December 2023");
        assert_eq!(chain.next(1).unwrap().title(), "February 2024");
        assert!(chain.previous(0).is_none());
        assert!(chain.next(2).is_none());
    }

    #[test]
    fn chain_has_no_cycles() {
        let chain = PlaylistChain::link(
            (1..=12).map(|m| playlist(Scope::month(2024, m), &[])).collect(),
        );
        let mut steps = 0;
        let mut at = Some(0);
        while let Some(i) = at {
            steps += 1;
            assert!(steps <= chain.len());
            at = chain.links(i).unwrap().next;
        }
        assert_eq!(steps, 12);
    }

    #[test]
    fn rank_delta_between_consecutive_periods() {
        let chain = PlaylistChain::link(vec![
            playlist(Scope::month(2024, 1), &["a", "b", "c"]),
            playlist(Scope::month(2024, 2), &["b", "a", "c", "d"]),
        ]);
        let feb = chain.find(&Scope::month(2024, 2)).unwrap();
        let tracks = &chain.get(feb).unwrap().tracks;

        // a: was 0, now 1 -> fell
        assert_eq!(chain.previous_rank(feb, &tracks[1]), Some(0));
        assert_eq!(chain.rank_delta(feb, 1), Some(-1));
        // b: was 1, now 0 -> rose
        assert_eq!(chain.previous_rank(feb, &tracks[0]), Some(1));
        assert_eq!(chain.rank_delta(feb, 0), Some(1));
        // c: unchanged
        assert_eq!(chain.rank_delta(feb, 2), Some(0));
        // d: new entry, no delta
        assert_eq!(chain.previous_rank(feb, &tracks[3]), None);
        assert_eq!(chain.rank_delta(feb, 3), None);
    }

    #[test]
    fn first_playlist_has_no_previous_rank() {
        let chain = PlaylistChain::link(vec![playlist(Scope::month(2024, 1), &["a"])]);
        let track = &chain.get(0).unwrap().tracks[0];
        assert_eq!(chain.previous_rank(0, track), None);
        assert_eq!(chain.rank_delta(0, 0), None);
        assert_eq!(chain.rank_delta(0, 5), None);
    }

    #[test]
    fn undated_playlists_go_last() {
        let chain = PlaylistChain::link(vec![
            playlist(Scope::AllTime, &[]),
            playlist(Scope::year(2023), &[]),
        ]);
        assert_eq!(chain.get(0).unwrap().scope, Scope::year(2023));
        assert_eq!(chain.get(1).unwrap().scope, Scope::AllTime);
    }
}
