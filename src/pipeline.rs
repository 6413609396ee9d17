//! Building the charts: days into months, months into years and the all
//! time chart, and the html pages on top of them.

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, bail};
use chrono::{Datelike, Local, Months, NaiveDate};

use crate::{
    config::Config,
    domain::{aggregate::Aggregator, chain::PlaylistChain, playlist::Playlist, scope::Scope},
    render::Site,
    scrape::{PlaylistSource, fetch_day},
    search::{cache::LookupCache, ytmusic::YtMusicClient},
    storage::playlists::PlaylistStore,
};

pub struct Charts {
    config: Config,
    store: PlaylistStore,
    cache: LookupCache,
    today: NaiveDate,
}

impl Charts {
    pub fn new(config: Config, store: PlaylistStore, cache: LookupCache) -> Self {
        Self {
            config,
            store,
            cache,
            today: Local::now().date_naive(),
        }
    }

    /// Opens the playlist store and the lookup cache described by `config`.
    pub fn open(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.paths.data_dir).with_context(|| {
            format!(
                "failed to create data directory {}",
                config.paths.data_dir.to_string_lossy()
            )
        })?;
        let store = PlaylistStore::new(&config.paths.data_dir);
        let backend = YtMusicClient::new(config.search.clone());
        let cache = LookupCache::load(&config.paths.lookup_cache, Box::new(backend))
            .context("failed to open the lookup cache")?;
        Ok(Self::new(config, store, cache))
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Playlist of one day. A saved day is reused as is, otherwise it is
    /// scraped, merged and saved.
    pub fn day(&mut self, source: &dyn PlaylistSource, date: NaiveDate) -> anyhow::Result<Playlist> {
        let scope = Scope::day(date);
        if self.store.exists(&scope) {
            log::debug!("{date} already fetched");
            return Ok(self.store.load(&scope)?);
        }

        let raw = fetch_day(source, date, self.config.scrape.max_pages)
            .with_context(|| format!("failed to fetch the playlist of {date}"))?;
        let mut playlist = Playlist::new(scope);
        playlist.add_tracks(raw.into_iter().map(|t| t.into_track()));
        playlist.sort();
        self.store.save(&playlist)?;
        log::info!("{date}: {} tracks, {} plays", playlist.len(), playlist.total_plays());
        Ok(playlist)
    }

    /// Monthly chart. With a source, every complete day of the month is
    /// built first and a day that cannot be fetched is left out. Without
    /// one, the saved chart is reused.
    pub fn month(
        &mut self,
        source: Option<&dyn PlaylistSource>,
        year: i32,
        month: u32,
    ) -> anyhow::Result<Playlist> {
        let scope = Scope::month(year, month);
        let mut playlist = match source {
            Some(source) => {
                let mut days = Vec::new();
                for date in days_of_month(year, month)? {
                    if date >= self.today {
                        log::debug!("{date} is not over yet, skipping");
                        continue;
                    }
                    match self.day(source, date) {
                        Ok(day) => days.push(day),
                        Err(err) => log::error!("skipping {date}: {err:#}"),
                    }
                }
                Aggregator::new(None).fold(scope, &days)
            }
            None => self.store.load(&scope).with_context(|| {
                format!(
                    "no saved playlist for {}, run with --fetch to get it from the radio",
                    scope.title()
                )
            })?,
        };

        playlist.sort();
        playlist.populate_yt_ids(&mut self.cache);
        self.store.save(&playlist)?;
        self.cache.save()?;
        Ok(playlist)
    }

    /// Yearly chart from the saved monthly ones, cut to the configured size.
    pub fn year(&mut self, year: i32) -> anyhow::Result<Playlist> {
        self.aggregate(Scope::year(year), Some(self.config.charts.yearly_top))
    }

    pub fn all_time(&mut self) -> anyhow::Result<Playlist> {
        self.aggregate(Scope::AllTime, None)
    }

    fn aggregate(&mut self, scope: Scope, top_n: Option<usize>) -> anyhow::Result<Playlist> {
        let months = self.store.load_months()?;
        if !months.iter().any(|m| scope.contains(&m.scope)) {
            bail!("no monthly playlists saved for {}", scope.title());
        }
        let playlist = Aggregator::new(top_n).aggregate(scope, &months, &mut self.cache);
        self.store.save(&playlist)?;
        self.cache.save()?;
        Ok(playlist)
    }

    /// Renders every saved month, year and the all time chart, then the
    /// index. Each kind gets its own chain so ranks compare like with like.
    pub fn render(&mut self) -> anyhow::Result<PathBuf> {
        let site = Site::new(&self.config.paths.web_dir);
        let all = self.store.load_all()?;

        let mut entries = Vec::new();
        for group in chart_groups(all) {
            let chain = PlaylistChain::link(group);
            entries.extend(site.write_chain(&chain, &mut self.cache)?);
        }
        let index = site.write_index(&entries)?;
        self.cache.save()?;
        Ok(index)
    }
}

/// Splits playlists into the sets that are ranked against each other:
/// days, months, years, all time, and every named chart on its own.
fn chart_groups(playlists: Vec<Playlist>) -> Vec<Vec<Playlist>> {
    let mut groups: BTreeMap<String, Vec<Playlist>> = BTreeMap::new();
    for playlist in playlists {
        let key = match &playlist.scope {
            Scope::Day { .. } => "day".to_string(),
            Scope::Month { .. } => "month".to_string(),
            Scope::Year { .. } => "year".to_string(),
            Scope::AllTime => "all-time".to_string(),
            Scope::Named { name } => format!("named:{name}"),
        };
        groups.entry(key).or_default().push(playlist);
    }
    groups.into_values().collect()
}

fn days_of_month(year: i32, month: u32) -> anyhow::Result<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .with_context(|| format!("invalid month {month}/{year}"))?;
    let next = first
        .checked_add_months(Months::new(1))
        .with_context(|| format!("month after {month}/{year} is out of range"))?;
    Ok(first.iter_days().take_while(|d| *d < next).collect())
}

/// The calendar month before the one `today` is in.
pub fn default_month(today: NaiveDate) -> (i32, u32) {
    if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    }
}

/// Year and month to build. A month given without a year that has not
/// started yet this year means last year's.
pub fn resolve_month(month: Option<u32>, year: Option<i32>, today: NaiveDate) -> anyhow::Result<(i32, u32)> {
    let Some(month) = month else {
        return Ok(match year {
            Some(year) => (year, default_month(today).1),
            None => default_month(today),
        });
    };
    if !(1..=12).contains(&month) {
        bail!("invalid month {month}, expected a number between 1 and 12");
    }
    if let Some(year) = year {
        return Ok((year, month));
    }
    if month > today.month() {
        Ok((today.year() - 1, month))
    } else {
        Ok((today.year(), month))
    }
}
