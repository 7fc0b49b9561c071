//! Test authoring session
//!
//! [`Editor`] owns the [`TestDefinition`] being edited and the state that
//! only matters while editing: step identities, the selected step, and the
//! text view with its parse status.
//!
//! Step ids are handed out from a per-editor counter and kept in a side
//! table parallel to `definition.steps`. They never appear in the document,
//! and every successful text parse assigns new ones.

use std::fmt;

use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::catalog::StepKind;
use crate::error::{BenchError, Result};
use crate::model::{ParamValue, Step, TestDefinition};
use crate::transcoder::{self, ParseError, Transcoder};

/// Editor-local identity of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(u64);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step-{}", self.0)
    }
}

/// Direction for [`Editor::move_step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Which representation the author is working in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Visual,
    Text,
}

#[derive(Debug, Clone)]
pub struct Editor {
    definition: TestDefinition,
    /// `ids[i]` identifies `definition.steps[i]`
    ids: Vec<StepId>,
    next_id: u64,
    selected: Option<StepId>,
    transcoder: Transcoder,
    view: ViewMode,
    /// Text view buffer; may hold an edit that does not parse
    text: String,
    text_error: Option<ParseError>,
    /// Bumped on every change to the definition
    revision: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Transcoder::default())
    }
}

impl Editor {
    /// Editor on the default four-step skeleton
    pub fn new(transcoder: Transcoder) -> Self {
        Self::with_definition(TestDefinition::default(), transcoder)
    }

    pub fn with_definition(definition: TestDefinition, transcoder: Transcoder) -> Self {
        let mut editor = Self {
            definition: TestDefinition::new("", "", Vec::new()),
            ids: Vec::new(),
            next_id: 1,
            selected: None,
            transcoder,
            view: ViewMode::Visual,
            text: String::new(),
            text_error: None,
            revision: 0,
        };
        editor.install(definition);
        editor
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn definition(&self) -> &TestDefinition {
        &self.definition
    }

    pub fn steps(&self) -> &[Step] {
        &self.definition.steps
    }

    pub fn ids(&self) -> &[StepId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn index_of(&self, id: StepId) -> Option<usize> {
        self.ids.iter().position(|&candidate| candidate == id)
    }

    pub fn id_at(&self, index: usize) -> Option<StepId> {
        self.ids.get(index).copied()
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.index_of(id).map(|i| &self.definition.steps[i])
    }

    pub fn selected(&self) -> Option<StepId> {
        self.selected
    }

    pub fn selected_step(&self) -> Option<&Step> {
        self.selected.and_then(|id| self.step(id))
    }

    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ------------------------------------------------------------------
    // Step operations
    // ------------------------------------------------------------------

    /// Append a step of `kind` populated from its schema and select it.
    pub fn add_step(&mut self, kind: StepKind) -> StepId {
        let id = self.fresh_id();
        self.definition.steps.push(Step::from_schema(kind));
        self.ids.push(id);
        self.selected = Some(id);
        debug!(%id, %kind, len = self.ids.len(), "added step");
        self.changed();
        id
    }

    /// Delete a step. Unknown ids are ignored.
    pub fn remove_step(&mut self, id: StepId) -> Option<Step> {
        let index = self.index_of(id)?;
        self.ids.remove(index);
        let step = self.definition.steps.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        debug!(%id, index, "removed step");
        self.changed();
        Some(step)
    }

    /// Swap the step at `index` with its neighbour. Returns `false`, leaving
    /// the sequence untouched, when there is no neighbour in that direction.
    pub fn move_step(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };
        let Some(target) = target.filter(|&t| t < self.ids.len() && index < self.ids.len())
        else {
            debug!(index, %direction, "move out of range ignored");
            return false;
        };
        self.ids.swap(index, target);
        self.definition.steps.swap(index, target);
        debug!(from = index, to = target, "moved step");
        self.changed();
        true
    }

    /// Set one parameter, keeping the others and their order.
    ///
    /// The value is stored as given; matching it to the schema type is the
    /// caller's job (see [`ParamValue::coerce`]). Fails only for names that
    /// could not be written to the document as a parameter.
    pub fn update_step_param(
        &mut self,
        id: StepId,
        name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<()> {
        if !transcoder::is_param_key(name) {
            return Err(BenchError::editor(format!(
                "'{}' cannot be used as a parameter name",
                name
            )));
        }
        let Some(index) = self.index_of(id) else {
            debug!(%id, "update for unknown step ignored");
            return Ok(());
        };
        let value = value.into();
        debug!(%id, param = name, %value, "updated parameter");
        self.definition.steps[index]
            .params
            .insert(name.to_string(), value);
        self.changed();
        Ok(())
    }

    /// Drop a parameter from a step
    pub fn remove_step_param(&mut self, id: StepId, name: &str) -> Option<ParamValue> {
        let index = self.index_of(id)?;
        let removed = self.definition.steps[index].params.shift_remove(name)?;
        debug!(%id, param = name, "removed parameter");
        self.changed();
        Some(removed)
    }

    pub fn update_step_description(&mut self, id: StepId, text: impl Into<String>) {
        let Some(index) = self.index_of(id) else {
            debug!(%id, "description update for unknown step ignored");
            return;
        };
        self.definition.steps[index].description = text.into();
        debug!(%id, "updated description");
        self.changed();
    }

    pub fn select(&mut self, id: Option<StepId>) {
        let known = id.filter(|&id| self.index_of(id).is_some());
        self.selected = known;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.definition.name = name.into();
        debug!(name = %self.definition.name, "renamed test");
        self.changed();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.definition.description = description.into();
        debug!("updated test description");
        self.changed();
    }

    // ------------------------------------------------------------------
    // Text view
    // ------------------------------------------------------------------

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Switching to the text view regenerates the buffer from the model.
    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
        if view == ViewMode::Text {
            self.text = self.to_text();
            self.text_error = None;
        }
    }

    /// Current text view buffer
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parse failure of the last text edit, if it did not parse
    pub fn text_error(&self) -> Option<&ParseError> {
        self.text_error.as_ref()
    }

    /// Serialized form of the current model
    pub fn to_text(&self) -> String {
        self.transcoder.serialize(&self.definition)
    }

    /// Replace the text buffer with an edit and re-parse it.
    ///
    /// On success the parsed definition replaces the model wholesale, with
    /// fresh step ids and no selection. On failure the error is recorded and
    /// the last good model stays in place.
    pub fn edit_text(&mut self, text: impl Into<String>) -> std::result::Result<(), ParseError> {
        self.text = text.into();
        match self.transcoder.parse(&self.text) {
            Ok(definition) => {
                self.text_error = None;
                self.install(definition);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "text edit does not parse, keeping previous model");
                self.text_error = Some(err.clone());
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn fresh_id(&mut self) -> StepId {
        let id = StepId(self.next_id);
        self.next_id += 1;
        id
    }

    fn install(&mut self, definition: TestDefinition) {
        let count = definition.steps.len();
        let ids: Vec<StepId> = (0..count).map(|_| self.fresh_id()).collect();
        self.ids = ids;
        self.definition = definition;
        self.selected = None;
        self.revision += 1;
        debug!(steps = count, "installed definition");
    }

    /// Keep the text view in step with model edits
    fn changed(&mut self) {
        self.revision += 1;
        if self.view == ViewMode::Text {
            self.text = self.to_text();
            self.text_error = None;
        }
    }
}
