// Chart lifetime across data fetches

use crate::binner::Resolution;
use crate::chart::ChartInstance;
use crate::config::ChartConfig;
use crate::event::Event;
use crate::layout::LayoutMode;
use crate::source::EventSource;
use anyhow::Result;
use tracing::{debug, info, warn};

/// Identifies one fetch; only the newest ticket may replace the chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    id: u64,
    resolution: Resolution,
}

impl FetchTicket {
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The chart was rebuilt from the fetched events
    Rebuilt,
    /// A newer fetch was issued meanwhile; the result was dropped
    Stale,
    /// The fetch failed; the previous chart is untouched
    Failed,
}

/// Owns the current chart and guards it against superseded fetches.
pub struct ChartSession {
    config: ChartConfig,
    initial_mode: LayoutMode,
    latest: u64,
    chart: Option<ChartInstance>,
}

impl ChartSession {
    pub fn new(config: ChartConfig, initial_mode: LayoutMode) -> Self {
        ChartSession {
            config,
            initial_mode,
            latest: 0,
            chart: None,
        }
    }

    pub fn chart(&self) -> Option<&ChartInstance> {
        self.chart.as_ref()
    }

    pub fn chart_mut(&mut self) -> Option<&mut ChartInstance> {
        self.chart.as_mut()
    }

    /// Issue a ticket for a fetch at `resolution`, superseding older ones
    pub fn begin_fetch(&mut self, resolution: Resolution) -> FetchTicket {
        self.latest += 1;
        debug!(ticket = self.latest, resolution = %resolution, "Fetch issued");
        FetchTicket {
            id: self.latest,
            resolution,
        }
    }

    /// Apply a fetch result if its ticket is still the newest
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Event>>,
    ) -> FetchOutcome {
        if ticket.id != self.latest {
            debug!(ticket = ticket.id, latest = self.latest, "Discarding stale fetch result");
            return FetchOutcome::Stale;
        }

        let events = match result {
            Ok(events) => events,
            Err(e) => {
                warn!("Data fetch failed, keeping previous chart: {:#}", e);
                return FetchOutcome::Failed;
            }
        };

        let mode = self
            .chart
            .as_ref()
            .map(ChartInstance::target_layout)
            .unwrap_or(self.initial_mode);

        match ChartInstance::build(events, ticket.resolution, mode, self.config.clone()) {
            Ok(chart) => {
                info!(resolution = %ticket.resolution, layout = %mode, "Chart rebuilt");
                self.chart = Some(chart);
                FetchOutcome::Rebuilt
            }
            Err(e) => {
                warn!("Chart rebuild failed, keeping previous chart: {:#}", e);
                FetchOutcome::Failed
            }
        }
    }

    /// Fetch from `source` and rebuild at `resolution` in one step
    pub fn refresh(
        &mut self,
        source: &mut dyn EventSource,
        resolution: Resolution,
    ) -> FetchOutcome {
        let ticket = self.begin_fetch(resolution);
        debug!(source = %source.describe(), "Fetching events");
        let result = source.fetch();
        self.complete_fetch(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::parse_timestamp;
    use crate::source::StaticSource;
    use anyhow::anyhow;
    use std::time::Duration;

    fn events() -> Vec<Event> {
        vec![
            Event::new(parse_timestamp("2024-06-01 23:50:00+0000").unwrap(), "A"),
            Event::new(parse_timestamp("2024-06-03 22:00:00+0000").unwrap(), "B"),
        ]
    }

    #[test]
    fn test_refresh_builds_chart() {
        let mut session = ChartSession::new(ChartConfig::default(), LayoutMode::Stacked);
        let mut source = StaticSource::new(events());
        assert_eq!(session.refresh(&mut source, Resolution::Day), FetchOutcome::Rebuilt);
        let chart = session.chart().unwrap();
        assert_eq!(chart.buckets().len(), 2);
        assert_eq!(chart.resolution(), Resolution::Day);
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let mut session = ChartSession::new(ChartConfig::default(), LayoutMode::Stacked);
        let slow = session.begin_fetch(Resolution::Hour);
        let fast = session.begin_fetch(Resolution::Month);

        assert_eq!(session.complete_fetch(fast, Ok(events())), FetchOutcome::Rebuilt);
        assert_eq!(session.complete_fetch(slow, Ok(Vec::new())), FetchOutcome::Stale);
        let chart = session.chart().unwrap();
        assert_eq!(chart.resolution(), Resolution::Month);
        assert_eq!(chart.buckets().len(), 1);
    }

    #[test]
    fn test_in_flight_fetch_loses_to_later_refresh() {
        let mut session = ChartSession::new(ChartConfig::default(), LayoutMode::Stacked);
        let mut source = StaticSource::new(events());
        session.refresh(&mut source, Resolution::Day);

        let in_flight = session.begin_fetch(Resolution::Day);
        assert_eq!(session.refresh(&mut source, Resolution::Month), FetchOutcome::Rebuilt);
        assert_eq!(session.complete_fetch(in_flight, Ok(events())), FetchOutcome::Stale);
        assert_eq!(session.chart().unwrap().resolution(), Resolution::Month);
    }

    #[test]
    fn test_failed_fetch_keeps_previous_chart() {
        let mut session = ChartSession::new(ChartConfig::default(), LayoutMode::Stacked);
        let first = session.begin_fetch(Resolution::Day);
        session.complete_fetch(first, Ok(events()));

        let second = session.begin_fetch(Resolution::Hour);
        let outcome = session.complete_fetch(second, Err(anyhow!("connection reset")));
        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(session.chart().unwrap().resolution(), Resolution::Day);
    }

    #[test]
    fn test_rebuild_keeps_layout_and_resets_zoom() {
        let mut session = ChartSession::new(ChartConfig::default(), LayoutMode::Stacked);
        let mut source = StaticSource::new(events());
        session.refresh(&mut source, Resolution::Day);
        {
            let chart = session.chart_mut().unwrap();
            chart.update(LayoutMode::Grouped, Duration::ZERO);
            chart.wheel(crate::interaction::Pointer::new(300.0, 100.0), 2.0, false);
        }
        session.refresh(&mut source, Resolution::Hour);
        let chart = session.chart().unwrap();
        assert_eq!(chart.layout_mode(), LayoutMode::Grouped);
        assert!(chart.view().x_zoom.is_identity());
        assert!(!chart.is_transitioning());
    }
}
