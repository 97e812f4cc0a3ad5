// Runtime executor for gesture scripts

use crate::binner::Resolution;
use crate::chart::ChartInstance;
use crate::graph::{self, OutputFormat};
use crate::interaction::Pointer;
use crate::parser::ast::{Command, Script};
use crate::session::{ChartSession, FetchOutcome};
use crate::source::EventSource;
use anyhow::{anyhow, Context, Result};
use std::time::Duration;
use tracing::{debug, info};

/// Drives a chart session through scripted commands on a virtual clock.
pub struct Runtime<'a> {
    session: ChartSession,
    source: &'a mut dyn EventSource,
    clock: Duration,
}

impl<'a> Runtime<'a> {
    /// Load the initial chart; a failing first fetch is fatal
    pub fn start(
        mut session: ChartSession,
        source: &'a mut dyn EventSource,
        resolution: Resolution,
    ) -> Result<Self> {
        let ticket = session.begin_fetch(resolution);
        let events = source
            .fetch()
            .with_context(|| format!("Failed to load events from {}", source.describe()))?;
        match session.complete_fetch(ticket, Ok(events)) {
            FetchOutcome::Rebuilt => Ok(Runtime {
                session,
                source,
                clock: Duration::ZERO,
            }),
            other => Err(anyhow!("Initial chart build did not complete ({:?})", other)),
        }
    }

    pub fn chart(&self) -> Result<&ChartInstance> {
        self.session.chart().context("No chart has been built")
    }

    fn chart_mut(&mut self) -> Result<&mut ChartInstance> {
        self.session.chart_mut().context("No chart has been built")
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn run(&mut self, script: &Script) -> Result<()> {
        for (idx, command) in script.commands.iter().enumerate() {
            self.execute(command)
                .with_context(|| format!("Script command {} ({:?}) failed", idx + 1, command))?;
        }
        Ok(())
    }

    pub fn execute(&mut self, command: &Command) -> Result<()> {
        debug!(?command, clock_ms = self.clock.as_millis() as u64, "Executing");
        let now = self.clock;
        match command {
            Command::Resolution(resolution) => {
                // Resolution changes re-fetch, like the recorder UI does
                let outcome = self.session.refresh(self.source, *resolution);
                info!(resolution = %resolution, ?outcome, "Resolution change");
            }
            Command::Layout(mode) => {
                let request = self.chart_mut()?.update(*mode, now);
                info!(layout = %mode, ?request, "Layout toggle");
            }
            Command::Wheel { x, y, k, shift } => {
                self.chart_mut()?.wheel(Pointer::new(*x, *y), *k, *shift);
            }
            Command::Drag { x, y, dx, dy } => {
                self.chart_mut()?.drag(Pointer::new(*x, *y), (*dx, *dy));
            }
            Command::Hover { x, y } => {
                let text = self.chart_mut()?.hover(Pointer::new(*x, *y)).map(|t| t.text.clone());
                match text {
                    Some(text) => info!(tooltip = %text, "Hover"),
                    None => debug!("Hover found no bar"),
                }
            }
            Command::Wait { ms } => {
                let clock = self
                    .clock
                    .checked_add(Duration::from_millis(*ms))
                    .ok_or_else(|| anyhow!("Virtual clock overflowed waiting {} ms", ms))?;
                self.clock = clock;
                self.chart_mut()?.tick(clock);
            }
            Command::Reset => {
                self.chart_mut()?.reset_zoom();
            }
        }
        Ok(())
    }

    /// Render the current frame
    pub fn render(&self, format: OutputFormat) -> Result<Vec<u8>> {
        let scene = self.chart()?.scene();
        graph::render(&scene, format).context("Failed to render chart")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartConfig;
    use crate::event::{parse_timestamp, Event};
    use crate::layout::LayoutMode;
    use crate::parser;
    use crate::scale::Axis;
    use crate::source::StaticSource;

    fn events() -> Vec<Event> {
        [
            ("2024-06-01 21:00:00+0000", "Pipistrellus"),
            ("2024-06-01 23:50:00+0000", "Myotis"),
            ("2024-06-02 00:10:00+0000", "Pipistrellus"),
            ("2024-06-04 22:00:00+0000", "Nyctalus"),
        ]
        .iter()
        .map(|(t, c)| Event::new(parse_timestamp(t).unwrap(), *c))
        .collect()
    }

    struct FailingSource;

    impl EventSource for FailingSource {
        fn fetch(&mut self) -> Result<Vec<Event>> {
            Err(anyhow!("server unreachable"))
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn session() -> ChartSession {
        ChartSession::new(ChartConfig::default(), LayoutMode::Stacked)
    }

    #[test]
    fn test_run_script_toggles_and_settles() {
        let mut source = StaticSource::new(events());
        let mut runtime = Runtime::start(session(), &mut source, Resolution::Day).unwrap();
        let script =
            parser::parse("wheel(x: 300, y: 120, k: 2) | layout(grouped) | wait(ms: 1000)").unwrap();
        runtime.run(&script).unwrap();

        let chart = runtime.chart().unwrap();
        assert_eq!(chart.layout_mode(), LayoutMode::Grouped);
        assert!(!chart.is_transitioning());
        assert_eq!(chart.transform(Axis::X).k, 2.0);
        assert_eq!(runtime.clock(), Duration::from_secs(1));
    }

    #[test]
    fn test_resolution_command_rebuilds() {
        let mut source = StaticSource::new(events());
        let mut runtime = Runtime::start(session(), &mut source, Resolution::Day).unwrap();
        runtime.execute(&Command::Resolution(Resolution::Month)).unwrap();
        assert_eq!(runtime.chart().unwrap().resolution(), Resolution::Month);
        assert_eq!(runtime.chart().unwrap().buckets().len(), 1);
    }

    #[test]
    fn test_start_fails_without_data() {
        let mut source = FailingSource;
        let err = Runtime::start(session(), &mut source, Resolution::Day).err().unwrap();
        assert!(format!("{:#}", err).contains("server unreachable"));
    }

    #[test]
    fn test_wait_overflow_is_an_error() {
        let mut source = StaticSource::new(events());
        let mut runtime = Runtime::start(session(), &mut source, Resolution::Day).unwrap();
        runtime.clock = Duration::MAX - Duration::from_millis(5);
        let err = runtime.execute(&Command::Wait { ms: u64::MAX }).unwrap_err();
        assert!(err.to_string().contains("overflowed"));
        assert_eq!(runtime.clock(), Duration::MAX - Duration::from_millis(5));
        assert!(runtime.execute(&Command::Wait { ms: 5 }).is_ok());
    }

    #[test]
    fn test_render_png() {
        let mut source = StaticSource::new(events());
        let runtime = Runtime::start(session(), &mut source, Resolution::Day).unwrap();
        let png = runtime.render(OutputFormat::Png).unwrap();
        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }
}
