//! Application state and its reducer.
//!
//! Form fields, accumulated data and request status live in one immutable
//! [`AppState`]. Every change goes through [`AppState::reduce`], which returns
//! a new state and never mutates the old one.

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_ROW_COUNT, STARTER_COLUMNS, STARTER_TOPIC};
use crate::dataset::{BatchResult, Column, Dataset, DatasetSpec, GeneratorConfig};

/// Where the session is in its request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Idle,
    /// A request is in flight; new requests are refused.
    Generating,
    /// The last request failed with this message.
    Failed(String),
}

/// A state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetTopic(String),
    SetContext(String),
    SetRowCount(u32),
    AddColumn(Column),
    SetColumns(Vec<Column>),
    UpdateColumn { index: usize, column: Column },
    RemoveColumn(usize),
    GenerationStarted,
    GenerationSucceeded(BatchResult),
    GenerationFailed(String),
    ClearData,
}

/// Complete session state: the dataset form plus everything generated so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub topic: String,
    pub columns: Vec<Column>,
    pub row_count: u32,
    pub context: String,
    pub dataset: Dataset,
    pub status: Status,
}

impl Default for AppState {
    /// A fresh session pre-filled with the starter schema.
    fn default() -> Self {
        Self {
            topic: STARTER_TOPIC.to_string(),
            columns: STARTER_COLUMNS
                .iter()
                .map(|(name, description)| Column::new(*name).with_description(*description))
                .collect(),
            row_count: DEFAULT_ROW_COUNT,
            context: String::new(),
            dataset: Dataset::new(),
            status: Status::Idle,
        }
    }
}

impl AppState {
    /// A session with an empty form.
    pub fn empty() -> Self {
        Self {
            topic: String::new(),
            columns: Vec::new(),
            ..Self::default()
        }
    }

    /// A session whose form is filled from a dataset spec.
    pub fn from_spec(spec: &DatasetSpec, default_rows: u32) -> Self {
        Self {
            topic: spec.topic.clone(),
            columns: spec.columns.clone(),
            row_count: spec.row_count.unwrap_or(default_rows),
            context: spec.context.clone().unwrap_or_default(),
            ..Self::empty()
        }
    }

    /// Applies `action` and returns the resulting state.
    pub fn reduce(&self, action: Action) -> Self {
        let mut next = self.clone();
        match action {
            Action::SetTopic(topic) => next.topic = topic,
            Action::SetContext(context) => next.context = context,
            Action::SetRowCount(count) => next.row_count = count,
            Action::AddColumn(column) => next.columns.push(column),
            Action::SetColumns(columns) => next.columns = columns,
            Action::UpdateColumn { index, column } => {
                if let Some(slot) = next.columns.get_mut(index) {
                    *slot = column;
                }
            }
            Action::RemoveColumn(index) => {
                if index < next.columns.len() {
                    next.columns.remove(index);
                }
            }
            Action::GenerationStarted => {
                if self.can_generate() {
                    next.status = Status::Generating;
                }
            }
            Action::GenerationSucceeded(result) => {
                next.dataset = self.dataset.absorb(&result);
                next.status = Status::Idle;
            }
            Action::GenerationFailed(message) => next.status = Status::Failed(message),
            Action::ClearData => {
                next.dataset = Dataset::new();
                next.status = Status::Idle;
            }
        }
        next
    }

    pub fn is_generating(&self) -> bool {
        self.status == Status::Generating
    }

    /// Whether a new request may start: a topic, at least one named column,
    /// and nothing already in flight.
    pub fn can_generate(&self) -> bool {
        !self.is_generating()
            && !self.topic.trim().is_empty()
            && self.columns.iter().any(|c| !c.name.trim().is_empty())
    }

    /// The last failure message, if the previous request failed.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            Status::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Snapshots the form into a request config. Columns with blank names
    /// are left out.
    pub fn generator_config(&self) -> GeneratorConfig {
        let columns = self
            .columns
            .iter()
            .filter(|c| !c.name.trim().is_empty())
            .cloned()
            .collect();
        GeneratorConfig::new(self.topic.clone(), columns, self.row_count)
            .with_context(self.context.clone())
    }
}
