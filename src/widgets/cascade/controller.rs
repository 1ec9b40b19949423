// SPDX-License-Identifier: MPL-2.0

//! The cascade state machine.

use futures_util::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::item::{ChoiceOption, Level, OptionId};
use super::message::{ApplyOutcome, CascadeMessage, FetchCompletion};
use super::state::ControlState;
use super::view::ControlView;
use crate::api::HierarchyResolver;
use crate::config::{CascadeConfig, DEFAULT_PLACEHOLDER_LABEL};
use crate::error::CascadeError;
use crate::observability::{FetchObserver, TracingObserver};

/// A children fetch started by the controller.
///
/// Awaiting it performs the lookup and yields the message to feed back into
/// [`CascadeController::update`]. Dropping it abandons the fetch; the level
/// simply stays in its loading state until the next change.
pub struct Task {
    /// Level the fetched children belong to.
    pub level: Level,
    /// Generation the completion will be checked against.
    pub generation: u64,
    future: BoxFuture<'static, CascadeMessage>,
}

impl Task {
    fn new(
        level: Level,
        generation: u64,
        future: impl Future<Output = CascadeMessage> + Send + 'static,
    ) -> Self {
        Self {
            level,
            generation,
            future: Box::pin(future),
        }
    }
}

impl IntoFuture for Task {
    type Output = CascadeMessage;
    type IntoFuture = BoxFuture<'static, CascadeMessage>;

    fn into_future(self) -> Self::IntoFuture {
        self.future
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("level", &self.level)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

struct Slot {
    name: String,
    state: ControlState,
    /// Bumped on every replacement; completions from older generations are stale.
    generation: u64,
    view: Option<Box<dyn ControlView>>,
}

/// Owns the state of every control in the chain.
///
/// Level 0 holds the root options; each deeper level lists the children of
/// the selection one level up, headed by the placeholder.
pub struct CascadeController {
    slots: Vec<Slot>,
    resolver: Arc<dyn HierarchyResolver>,
    observer: Arc<dyn FetchObserver>,
    placeholder_label: String,
}

impl CascadeController {
    pub fn builder(resolver: Arc<dyn HierarchyResolver>) -> CascadeBuilder {
        CascadeBuilder::new(resolver)
    }

    /// Number of controls, root included.
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn placeholder_label(&self) -> &str {
        &self.placeholder_label
    }

    pub fn state(&self, level: Level) -> Option<&ControlState> {
        self.slots.get(level).map(|s| &s.state)
    }

    /// Clone of every control state, root first.
    pub fn snapshot(&self) -> Vec<ControlState> {
        self.slots.iter().map(|s| s.state.clone()).collect()
    }

    pub fn generation(&self, level: Level) -> Option<u64> {
        self.slots.get(level).map(|s| s.generation)
    }

    /// Selected ids from the root down to the first control without a selection.
    pub fn selection_path(&self) -> Vec<&str> {
        self.slots
            .iter()
            .map_while(|s| s.state.selected_id())
            .collect()
    }

    /// Handle a message and return the fetch to run next, if any.
    pub fn update(&mut self, message: CascadeMessage) -> Result<Option<Task>, CascadeError> {
        match message {
            CascadeMessage::SelectionChanged { level, selected } => self.select(level, selected),
            CascadeMessage::ChildrenLoaded(completion) => {
                self.apply(completion);
                Ok(None)
            }
        }
    }

    /// The control at `level` now selects `id` (empty to clear).
    ///
    /// Every control below is reset synchronously. When `id` is non-empty and
    /// a level below exists, the returned task fetches that level's children.
    pub fn select(
        &mut self,
        level: Level,
        id: impl Into<OptionId>,
    ) -> Result<Option<Task>, CascadeError> {
        let id = id.into();
        let depth = self.depth();
        let slot = self
            .slots
            .get_mut(level)
            .ok_or(CascadeError::UnknownLevel { level, depth })?;

        if !slot.state.contains(&id) {
            return Err(CascadeError::UnknownOption { level, id });
        }

        slot.state.selected = (!id.is_empty()).then(|| id.clone());
        self.notify(level);

        let child = level + 1;
        if child >= depth {
            return Ok(None);
        }

        if id.is_empty() {
            info!(level, name = %self.slots[level].name, "selection cleared, resetting levels below");
            self.clear_from(child);
            return Ok(None);
        }

        self.clear_from(child + 1);
        let generation = self.replace(child, ControlState::loading(&self.placeholder_label, &id));
        info!(
            level = child,
            name = %self.slots[child].name,
            parent = %id,
            generation,
            "fetching children"
        );

        let resolver = Arc::clone(&self.resolver);
        let future = async move {
            let result = resolver.fetch_children(child, &id).await;
            CascadeMessage::ChildrenLoaded(FetchCompletion {
                level: child,
                parent: id,
                generation,
                result,
            })
        };
        Ok(Some(Task::new(child, generation, future)))
    }

    /// Apply a finished fetch, unless a later change superseded it.
    pub fn apply(&mut self, completion: FetchCompletion) -> ApplyOutcome {
        let FetchCompletion {
            level,
            parent,
            generation,
            result,
        } = completion;

        let current = match self.slots.get(level) {
            Some(slot) => slot.generation,
            None => {
                warn!(level, "completion for a level outside the chain");
                return ApplyOutcome::Stale;
            }
        };
        if current != generation {
            debug!(level, parent = %parent, generation, current, "discarding stale response");
            self.observer.stale_discarded(level, &parent);
            return ApplyOutcome::Stale;
        }

        let outcome = match result {
            Ok(children) => {
                let count = children.len();
                self.replace(
                    level,
                    ControlState::with_children(&self.placeholder_label, &parent, children),
                );
                info!(level, parent = %parent, count, "children applied");
                ApplyOutcome::Applied { count }
            }
            Err(error) => {
                self.observer.fetch_failed(level, &parent, &error);
                self.replace(
                    level,
                    ControlState::failed(&self.placeholder_label, &parent, error.to_string()),
                );
                ApplyOutcome::Failed
            }
        };

        self.clear_from(level + 1);
        outcome
    }

    /// Reset every control from `level` down.
    fn clear_from(&mut self, level: Level) {
        for lvl in level..self.depth() {
            let slot = &self.slots[lvl];
            // An idle reset control has nothing in flight to invalidate.
            if slot.state.is_reset() && slot.state.status.is_idle() {
                continue;
            }
            debug!(level = lvl, name = %slot.name, "clearing");
            let reset = ControlState::reset(&self.placeholder_label);
            self.replace(lvl, reset);
        }
    }

    fn replace(&mut self, level: Level, state: ControlState) -> u64 {
        let slot = &mut self.slots[level];
        slot.state = state;
        slot.generation += 1;
        let generation = slot.generation;
        self.notify(level);
        generation
    }

    fn notify(&mut self, level: Level) {
        let slot = &mut self.slots[level];
        if let Some(view) = slot.view.as_mut() {
            view.replace(level, &slot.state);
        }
    }
}

impl fmt::Debug for CascadeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadeController")
            .field("states", &self.snapshot())
            .field("placeholder_label", &self.placeholder_label)
            .finish_non_exhaustive()
    }
}

/// Assembles a [`CascadeController`] from the server-rendered controls.
pub struct CascadeBuilder {
    resolver: Arc<dyn HierarchyResolver>,
    observer: Option<Arc<dyn FetchObserver>>,
    placeholder_label: String,
    names: Vec<String>,
    roots: Vec<ChoiceOption>,
    root_selected: Option<OptionId>,
    /// Raw options and selection per level. The placeholder is added in
    /// `build`, once the label is final.
    initial: BTreeMap<Level, (Vec<ChoiceOption>, Option<OptionId>)>,
    views: BTreeMap<Level, Box<dyn ControlView>>,
}

impl CascadeBuilder {
    fn new(resolver: Arc<dyn HierarchyResolver>) -> Self {
        Self {
            resolver,
            observer: None,
            placeholder_label: DEFAULT_PLACEHOLDER_LABEL.to_string(),
            names: vec!["category".to_string()],
            roots: Vec::new(),
            root_selected: None,
            initial: BTreeMap::new(),
            views: BTreeMap::new(),
        }
    }

    /// Take depth, level names and placeholder label from `config`.
    pub fn from_config(mut self, config: &CascadeConfig) -> Self {
        self.placeholder_label = config.placeholder_label.clone();
        self.names = (0..config.depth())
            .map(|l| config.level_name(l).to_string())
            .collect();
        self
    }

    /// Chain of `depth` controls with generic names.
    pub fn depth(mut self, depth: usize) -> Self {
        self.names = (0..depth.max(1)).map(|l| format!("level{}", l)).collect();
        self
    }

    pub fn placeholder_label(mut self, label: impl Into<String>) -> Self {
        self.placeholder_label = label.into();
        self
    }

    /// Options of the level 0 control, in display order.
    pub fn roots(mut self, roots: Vec<ChoiceOption>) -> Self {
        self.roots = roots;
        self
    }

    pub fn root_selection(mut self, id: impl Into<OptionId>) -> Self {
        self.root_selected = Some(id.into()).filter(|id| !id.is_empty());
        self
    }

    /// Server-rendered options and selection of a dependent control.
    pub fn initial(
        mut self,
        level: Level,
        options: Vec<ChoiceOption>,
        selected: Option<OptionId>,
    ) -> Self {
        self.initial.insert(level, (options, selected));
        self
    }

    /// Attach the handle notified whenever the control at `level` changes.
    pub fn view(mut self, level: Level, view: impl ControlView + 'static) -> Self {
        self.views.insert(level, Box::new(view));
        self
    }

    pub fn observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<CascadeController, CascadeError> {
        let depth = self.names.len();
        // Level 0 takes its options from `roots`, never from `initial`.
        let misplaced = self
            .initial
            .keys()
            .copied()
            .find(|&l| l == 0 || l >= depth)
            .or_else(|| self.views.keys().copied().find(|&l| l >= depth));
        if let Some(level) = misplaced {
            return Err(CascadeError::UnknownLevel { level, depth });
        }

        let mut root = ControlState::root(self.roots);
        if let Some(id) = self.root_selected {
            if !root.contains(&id) {
                return Err(CascadeError::UnknownOption { level: 0, id });
            }
            root.selected = Some(id);
        }

        let mut initial = self.initial;
        let mut views = self.views;
        let mut states = Vec::with_capacity(depth);
        states.push(root);
        for level in 1..depth {
            let parent_selected = states[level - 1].selected.is_some();
            let state = match initial.remove(&level) {
                Some((options, selected)) if parent_selected => {
                    let state = ControlState::initial(&self.placeholder_label, options, selected);
                    if let Some(id) = state.selected_id() {
                        if !state.contains(id) {
                            return Err(CascadeError::UnknownOption {
                                level,
                                id: id.to_string(),
                            });
                        }
                    }
                    state
                }
                Some(_) => {
                    warn!(level, "initial options below an empty selection, resetting");
                    ControlState::reset(&self.placeholder_label)
                }
                None => ControlState::reset(&self.placeholder_label),
            };
            states.push(state);
        }

        let slots = self
            .names
            .into_iter()
            .zip(states)
            .enumerate()
            .map(|(level, (name, state))| Slot {
                name,
                state,
                generation: 0,
                view: views.remove(&level),
            })
            .collect();

        let mut controller = CascadeController {
            slots,
            resolver: self.resolver,
            observer: self
                .observer
                .unwrap_or_else(|| Arc::new(TracingObserver)),
            placeholder_label: self.placeholder_label,
        };
        for level in 0..depth {
            controller.notify(level);
        }
        Ok(controller)
    }
}
