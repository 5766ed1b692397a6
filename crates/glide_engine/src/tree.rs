//! Controller tree & scroll handoff
//!
//! Controllers live in a slotmap arena keyed by [`ControllerId`]; parent
//! links express the scroll handoff hierarchy. The tree never holds two
//! controller locks at once: handoff walks the chain iteratively, locking
//! one controller per hop, so a controller callback can always re-enter
//! the tree without deadlocking.

use std::sync::{Arc, Mutex};

use glide_core::{GlideConfig, InputEvent, Vector};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use tracing::{debug, warn};

use crate::controller::{ControllerShared, HandleResult};
use crate::metadata::{MetadataError, ScrollMetadata};
use crate::observer::{ControllerObserver, DeferredTask};
use crate::ControllerId;

struct Node {
    controller: Arc<ControllerShared>,
    parent: Option<ControllerId>,
}

struct TreeState {
    nodes: SlotMap<ControllerId, Node>,
    /// Content-assigned scroll ids to arena keys.
    by_scroll_id: FxHashMap<u64, ControllerId>,
    /// Time-gated deferred tasks waiting for their deadline.
    scheduled: Vec<DeferredTask>,
}

/// The collection of controllers for one compositor, plus the handoff
/// logic that moves scrolling between them.
pub struct ControllerTree {
    state: Mutex<TreeState>,
    config: Mutex<GlideConfig>,
    observer: Arc<dyn ControllerObserver>,
}

impl ControllerTree {
    pub fn new(config: GlideConfig, observer: Arc<dyn ControllerObserver>) -> Self {
        Self {
            state: Mutex::new(TreeState {
                nodes: SlotMap::with_key(),
                by_scroll_id: FxHashMap::default(),
                scheduled: Vec::new(),
            }),
            config: Mutex::new(config),
            observer,
        }
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Register a scrollable region. `scroll_id` is the content-assigned
    /// identity; `parent` is the handoff target for unconsumed scrolling.
    pub fn register(&self, scroll_id: u64, parent: Option<ControllerId>) -> ControllerId {
        let config = self.config.lock().unwrap().clone();
        let observer = Arc::clone(&self.observer);
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = parent {
            if !state.nodes.contains_key(parent) {
                warn!(scroll_id, "registering under a stale parent, detaching");
            }
        }
        let id = state.nodes.insert_with_key(|key| Node {
            controller: Arc::new(ControllerShared::new(key, config, observer)),
            parent: None,
        });
        // Validate the parent link with the node in place so a stale or
        // self-referential parent degrades to a detached root.
        let parent = parent.filter(|p| state.nodes.contains_key(*p) && *p != id);
        state.nodes[id].parent = parent;
        state.by_scroll_id.insert(scroll_id, id);
        debug!(scroll_id, ?id, ?parent, "registered controller");
        id
    }

    /// Remove a controller; children keep their (now dangling) parent
    /// links, which handoff treats as chain ends.
    pub fn unregister(&self, id: ControllerId) {
        let mut state = self.state.lock().unwrap();
        state.nodes.remove(id);
        state.by_scroll_id.retain(|_, v| *v != id);
    }

    pub fn controller(&self, id: ControllerId) -> Option<Arc<ControllerShared>> {
        let state = self.state.lock().unwrap();
        state.nodes.get(id).map(|n| Arc::clone(&n.controller))
    }

    pub fn by_scroll_id(&self, scroll_id: u64) -> Option<Arc<ControllerShared>> {
        let state = self.state.lock().unwrap();
        let id = state.by_scroll_id.get(&scroll_id)?;
        state.nodes.get(*id).map(|n| Arc::clone(&n.controller))
    }

    /// The handoff chain starting at `origin`: the controller itself, then
    /// each ancestor in order. Cycles are cut defensively.
    pub fn build_handoff_chain(&self, origin: ControllerId) -> Vec<ControllerId> {
        let state = self.state.lock().unwrap();
        let mut chain = Vec::new();
        let mut cursor = Some(origin);
        while let Some(id) = cursor {
            if chain.contains(&id) {
                warn!(?id, "parent cycle in handoff chain");
                break;
            }
            let Some(node) = state.nodes.get(id) else {
                break;
            };
            chain.push(id);
            cursor = node.parent;
        }
        chain
    }

    // ------------------------------------------------------------------
    // Input dispatch
    // ------------------------------------------------------------------

    /// Route an input event to `target`, then walk unconsumed displacement
    /// up the handoff chain, one controller lock at a time.
    pub fn dispatch_event(&self, target: ControllerId, event: &InputEvent) -> HandleResult {
        let chain = self.build_handoff_chain(target);
        let Some(controller) = self.controller(target) else {
            return HandleResult {
                status: glide_core::EventStatus::Ignored,
                unconsumed: Vector::ZERO,
                deferred: Vec::new(),
            };
        };
        let now = event.time();
        let mut result = controller.handle_event(event, &chain);

        if !result.unconsumed.is_zero() {
            let leftover = self.attempt_scroll(&chain, 1, result.unconsumed, now);
            result.unconsumed = leftover;
            if !leftover.is_zero() {
                // Nothing in the chain wanted it; the tail holds the
                // overscroll until the gesture releases it.
                if let Some(tail) = chain.last().and_then(|id| self.controller(*id)) {
                    let mut deferred = tail.apply_gesture_overscroll(leftover, now);
                    result.deferred.append(&mut deferred);
                }
            }
        }

        // A gesture release lets any controller that accumulated handed-off
        // overscroll spring back. Wheel and keyboard scrolls have no
        // release event, so any overscroll they land is released at once.
        if matches!(
            event,
            InputEvent::TouchEnd { .. }
                | InputEvent::TouchCancel { .. }
                | InputEvent::PanEnd { .. }
                | InputEvent::PanMomentumEnd { .. }
                | InputEvent::PinchEnd { .. }
                | InputEvent::Wheel { .. }
                | InputEvent::KeyboardScroll { .. }
        ) {
            for id in &chain {
                if let Some(ctrl) = self.controller(*id) {
                    let mut deferred = ctrl.release_overscroll(now);
                    result.deferred.append(&mut deferred);
                }
            }
        }

        let deferred = std::mem::take(&mut result.deferred);
        self.run_now(deferred, now);
        result
    }

    /// Forward-consumption scroll handoff: each controller from `index`
    /// onward takes what its scroll range allows; the remainder continues.
    pub fn attempt_scroll(
        &self,
        chain: &[ControllerId],
        index: usize,
        delta: Vector,
        now: f64,
    ) -> Vector {
        let mut remaining = delta;
        for id in chain.iter().skip(index) {
            if remaining.is_zero() {
                break;
            }
            let Some(controller) = self.controller(*id) else {
                break;
            };
            let (leftover, deferred) = controller.consume_scroll(remaining, now);
            self.run_now(deferred, now);
            remaining = leftover;
        }
        remaining
    }

    /// Continue a fling along the chain. Velocity no controller accepts
    /// becomes an overscroll spring at the fling's origin.
    pub fn dispatch_fling(
        &self,
        chain: &[ControllerId],
        index: usize,
        velocity: Vector,
        now: f64,
    ) {
        let mut remaining = velocity;
        for (position, id) in chain.iter().enumerate().skip(index) {
            if remaining.is_zero() {
                return;
            }
            let Some(controller) = self.controller(*id) else {
                break;
            };
            let (residual, deferred) = controller.accept_fling(remaining, chain, position, now);
            self.run_now(deferred, now);
            remaining = residual;
        }
        if !remaining.is_zero() {
            if let Some(origin) = chain.first().and_then(|id| self.controller(*id)) {
                let deferred = origin.overscroll_from_fling(remaining, now);
                self.run_now(deferred, now);
            }
        }
    }

    // ------------------------------------------------------------------
    // Frame driving
    // ------------------------------------------------------------------

    /// Advance every animation to `now` and run due deferred work.
    /// Returns true when any controller wants another frame.
    pub fn update_animations(&self, now: f64) -> bool {
        let ids: Vec<ControllerId> = {
            let state = self.state.lock().unwrap();
            state.nodes.keys().collect()
        };
        let mut produced = Vec::new();
        for id in &ids {
            if let Some(controller) = self.controller(*id) {
                produced.extend(controller.update_animation(now));
            }
        }
        let leftover = self.run_deferred(produced, now);
        {
            let mut state = self.state.lock().unwrap();
            state.scheduled.extend(leftover);
        }
        let due = {
            let mut state = self.state.lock().unwrap();
            take_due(&mut state.scheduled, now)
        };
        let leftover = self.run_deferred(due, now);
        {
            let mut state = self.state.lock().unwrap();
            state.scheduled.extend(leftover);
        }

        let state = self.state.lock().unwrap();
        !state.scheduled.is_empty() || state.nodes.values().any(|n| n.controller.wants_frame())
    }

    /// Run deferred tasks whose time has come; the rest are returned to be
    /// rescheduled.
    fn run_deferred(&self, tasks: Vec<DeferredTask>, now: f64) -> Vec<DeferredTask> {
        let mut pending = Vec::new();
        let mut queue = tasks;
        // Tasks may produce more tasks (a handoff fling hitting another
        // boundary); drain until quiescent.
        while let Some(task) = queue.pop() {
            match task {
                DeferredTask::HandoffFling {
                    chain,
                    index,
                    velocity,
                } => {
                    self.dispatch_fling(&chain, index, velocity, now);
                }
                DeferredTask::TransformEnd { id, deadline } => {
                    if deadline > now {
                        pending.push(DeferredTask::TransformEnd { id, deadline });
                    } else if let Some(controller) = self.controller(id) {
                        queue.extend(controller.run_transform_end(now));
                    }
                }
                DeferredTask::DelayedRepaint { id, deadline } => {
                    if deadline > now {
                        pending.push(DeferredTask::DelayedRepaint { id, deadline });
                    } else if let Some(controller) = self.controller(id) {
                        queue.extend(controller.run_delayed_repaint(now));
                    }
                }
            }
        }
        pending
    }

    /// Run tasks immediately, rescheduling any that are time-gated.
    fn run_now(&self, tasks: Vec<DeferredTask>, now: f64) {
        let pending = self.run_deferred(tasks, now);
        if !pending.is_empty() {
            let mut state = self.state.lock().unwrap();
            state.scheduled.extend(pending);
        }
    }

    // ------------------------------------------------------------------
    // Content & configuration
    // ------------------------------------------------------------------

    /// Apply an authoritative content-side metadata update by scroll id.
    pub fn notify_layers_updated(
        &self,
        scroll_id: u64,
        metadata: ScrollMetadata,
        first_paint: bool,
        relative: bool,
        now: f64,
    ) -> Result<(), MetadataError> {
        let Some(controller) = self.by_scroll_id(scroll_id) else {
            warn!(scroll_id, "metadata update for unknown scroll id");
            return Ok(());
        };
        let deferred = controller.notify_layers_updated(metadata, first_paint, relative, now)?;
        self.run_now(deferred, now);
        Ok(())
    }

    /// Swap the configuration on the tree and every live controller.
    pub fn update_config(&self, config: GlideConfig) {
        *self.config.lock().unwrap() = config.clone();
        let controllers: Vec<Arc<ControllerShared>> = {
            let state = self.state.lock().unwrap();
            state
                .nodes
                .values()
                .map(|n| Arc::clone(&n.controller))
                .collect()
        };
        for controller in controllers {
            controller.update_config(config.clone());
        }
    }
}

fn take_due(scheduled: &mut Vec<DeferredTask>, now: f64) -> Vec<DeferredTask> {
    let mut due = Vec::new();
    scheduled.retain(|task| match task {
        DeferredTask::TransformEnd { deadline, .. }
        | DeferredTask::DelayedRepaint { deadline, .. } => {
            if *deadline <= now {
                due.push(task.clone());
                false
            } else {
                true
            }
        }
        DeferredTask::HandoffFling { .. } => {
            due.push(task.clone());
            false
        }
    });
    due
}
