//! Scripted in-memory [`FormDriver`] for engine and orchestrator tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{BarHandle, ChartResponse, DriverError, FormDriver};
use crate::grid::Coordinate;

/// Scripted outcome for one bar of one cell.
#[derive(Debug, Clone)]
pub struct MockBar {
    pub hover_fails: bool,
    /// `None` simulates a tooltip that never rendered.
    pub tooltip: Option<String>,
}

impl MockBar {
    pub fn ok(text: &str) -> Self {
        Self {
            hover_fails: false,
            tooltip: Some(text.to_string()),
        }
    }

    pub fn hover_failure() -> Self {
        Self {
            hover_fails: true,
            tooltip: None,
        }
    }

    pub fn missing_tooltip() -> Self {
        Self {
            hover_fails: false,
            tooltip: None,
        }
    }
}

/// Scripted response for one cell, consumed in submission order.
#[derive(Debug, Clone)]
pub enum MockCell {
    NoData,
    Bars(Vec<MockBar>),
}

/// State shared with the test for post-hoc inspection.
#[derive(Debug, Default)]
pub struct MockState {
    pub submitted: Vec<Coordinate>,
    pub closed: bool,
}

pub struct MockDriver {
    cells: VecDeque<MockCell>,
    current: Option<MockCell>,
    last_hovered: Option<usize>,
    pub state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new(cells: Vec<MockCell>) -> Self {
        Self {
            cells: cells.into(),
            current: None,
            last_hovered: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn state_handle(&self) -> Arc<Mutex<MockState>> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl FormDriver for MockDriver {
    async fn submit(&mut self, coord: Coordinate) -> Result<(), DriverError> {
        self.state.lock().unwrap().submitted.push(coord);
        self.last_hovered = None;
        self.current = Some(
            self.cells
                .pop_front()
                .ok_or_else(|| DriverError::Script("no scripted cell left".to_string()))?,
        );
        Ok(())
    }

    async fn classify(&mut self) -> Result<ChartResponse, DriverError> {
        match &self.current {
            Some(MockCell::NoData) => Ok(ChartResponse::NoData),
            Some(MockCell::Bars(bars)) => Ok(ChartResponse::SeriesPresent {
                bars: (0..bars.len()).map(BarHandle).collect(),
            }),
            None => Err(DriverError::Script("classify before submit".to_string())),
        }
    }

    async fn hover_bar(&mut self, bar: BarHandle) -> Result<(), DriverError> {
        let Some(MockCell::Bars(bars)) = &self.current else {
            return Err(DriverError::Script("hover without a chart".to_string()));
        };
        let scripted = bars.get(bar.0).ok_or(DriverError::StaleBar(bar.0))?;
        if scripted.hover_fails {
            self.last_hovered = None;
            return Err(DriverError::StaleBar(bar.0));
        }
        self.last_hovered = Some(bar.0);
        Ok(())
    }

    async fn read_tooltip(&mut self) -> Result<String, DriverError> {
        let Some(MockCell::Bars(bars)) = &self.current else {
            return Err(DriverError::Script("tooltip without a chart".to_string()));
        };
        let index = self
            .last_hovered
            .ok_or(DriverError::EmptyTooltip)?;
        bars[index]
            .tooltip
            .clone()
            .ok_or(DriverError::EmptyTooltip)
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
