//! End-to-end gesture tests for a single controller: touch pans, flings,
//! overscroll, wheel and keyboard scrolling, pinch zoom and the sampled
//! compositing pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use glide_core::{
    config::PinchLockMode, AxisLockMode, EventStatus, GlideConfig, InputEvent,
    KeyboardScrollAction, Point, Rect, ScrollUnit, SideBits, TapKind, Vector, WheelDeliveryMode,
};
use glide_engine::{
    ControllerId, ControllerObserver, ControllerTree, OverscrollBehavior, PanZoomState,
    ScrollDirection, ScrollMetadata, SnapInfo, SnapPoint, SnapTargetIds,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct Recorder {
    transform_begins: AtomicUsize,
    transform_ends: AtomicUsize,
    states: Mutex<Vec<(PanZoomState, PanZoomState)>>,
    snaps: Mutex<Vec<SnapTargetIds>>,
    repaints: AtomicUsize,
}

impl ControllerObserver for Recorder {
    fn on_transform_begin(&self, _id: ControllerId) {
        self.transform_begins.fetch_add(1, Ordering::SeqCst);
    }

    fn on_transform_end(&self, _id: ControllerId) {
        self.transform_ends.fetch_add(1, Ordering::SeqCst);
    }

    fn on_state_change(&self, _id: ControllerId, old: PanZoomState, new: PanZoomState) {
        self.states.lock().unwrap().push((old, new));
    }

    fn on_snap_targets(&self, _id: ControllerId, targets: SnapTargetIds) {
        self.snaps.lock().unwrap().push(targets);
    }

    fn request_repaint(&self, _request: &glide_engine::RepaintRequest) {
        self.repaints.fetch_add(1, Ordering::SeqCst);
    }
}

fn metadata(scroll_height: f32) -> ScrollMetadata {
    ScrollMetadata {
        composition_bounds: Rect::new(0.0, 0.0, 400.0, 400.0),
        scrollable_rect: Rect::new(0.0, 0.0, 400.0, scroll_height),
        ..Default::default()
    }
}

struct Harness {
    tree: ControllerTree,
    id: ControllerId,
    recorder: Arc<Recorder>,
}

fn harness_with(config: GlideConfig, meta: ScrollMetadata) -> Harness {
    init_tracing();
    let recorder = Arc::new(Recorder::default());
    let tree = ControllerTree::new(config, recorder.clone());
    let id = tree.register(1, None);
    tree.notify_layers_updated(1, meta, true, false, 0.0).unwrap();
    Harness { tree, id, recorder }
}

fn harness(scroll_height: f32) -> Harness {
    harness_with(GlideConfig::default(), metadata(scroll_height))
}

impl Harness {
    fn controller(&self) -> Arc<glide_engine::ControllerShared> {
        self.tree.controller(self.id).unwrap()
    }

    fn send(&self, event: InputEvent) -> EventStatus {
        self.tree.dispatch_event(self.id, &event).status
    }

    /// Drive animations until nothing wants a frame or the budget runs out.
    /// Samples the compositor each frame, like the render thread would, so
    /// pending snapshots in the sampled queue are drained.
    fn settle(&self, mut now: f64) -> f64 {
        for _ in 0..4000 {
            now += 16.0;
            let wants_frame = self.tree.update_animations(now);
            self.controller().sample_for_composite();
            if !wants_frame {
                break;
            }
        }
        now
    }
}

fn touch_pan(h: &Harness, from: Point, to: Point, steps: usize, step_ms: f64) -> f64 {
    let mut now = 0.0;
    h.send(InputEvent::TouchStart {
        position: from,
        time: now,
    });
    for i in 1..=steps {
        now += step_ms;
        let t = i as f32 / steps as f32;
        h.send(InputEvent::TouchMove {
            position: from + (to - from) * t,
            historical: Vec::new(),
            time: now,
        });
    }
    now
}

#[test]
fn touch_pan_scrolls_content() {
    let h = harness(1000.0);
    let now = touch_pan(&h, Point::new(200.0, 500.0), Point::new(200.0, 300.0), 5, 16.0);
    // Finger moved up 200px, so content scrolled down 200.
    assert_eq!(h.controller().scroll_offset().y, 200.0);
    assert_eq!(h.controller().scroll_offset().x, 0.0);
    assert!(h.controller().pan_zoom_state().is_panning());
    h.send(InputEvent::TouchEnd { time: now + 200.0 });
}

#[test]
fn pan_past_range_overscrolls_and_springs_back() {
    // A 500px pan into a 300px range: 300 scrolls, 200 becomes overscroll,
    // and the release starts the snap-back spring, never a fling.
    let h = harness(700.0);
    let now = touch_pan(&h, Point::new(200.0, 550.0), Point::new(200.0, 50.0), 5, 16.0);
    let controller = h.controller();
    assert_eq!(controller.scroll_offset().y, 300.0);
    assert!((controller.overscroll().y - 200.0).abs() < 0.01);

    h.send(InputEvent::TouchEnd { time: now + 16.0 });
    assert_eq!(
        controller.pan_zoom_state(),
        PanZoomState::OverscrollAnimation
    );
    assert!(!h
        .recorder
        .states
        .lock()
        .unwrap()
        .iter()
        .any(|(_, new)| *new == PanZoomState::Fling));

    h.settle(now + 16.0);
    assert!(!controller.is_overscrolled());
    assert_eq!(controller.pan_zoom_state(), PanZoomState::Idle);
    assert_eq!(controller.scroll_offset().y, 300.0);
}

#[test]
fn fast_release_starts_a_fling() {
    let h = harness(5000.0);
    let now = touch_pan(&h, Point::new(200.0, 600.0), Point::new(200.0, 200.0), 10, 16.0);
    h.send(InputEvent::TouchEnd { time: now });
    let controller = h.controller();
    assert_eq!(controller.pan_zoom_state(), PanZoomState::Fling);

    let before = controller.scroll_offset().y;
    h.settle(now);
    assert!(controller.scroll_offset().y > before);
    assert_eq!(controller.pan_zoom_state(), PanZoomState::Idle);
}

#[test]
fn touching_down_catches_a_fling() {
    let h = harness(5000.0);
    let now = touch_pan(&h, Point::new(200.0, 600.0), Point::new(200.0, 200.0), 10, 16.0);
    h.send(InputEvent::TouchEnd { time: now });
    h.tree.update_animations(now + 16.0);
    h.tree.update_animations(now + 32.0);
    let mid = h.controller().scroll_offset().y;

    h.send(InputEvent::TouchStart {
        position: Point::new(200.0, 300.0),
        time: now + 40.0,
    });
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::Touching);
    h.settle(now + 40.0);
    // The catch froze the scroll where it was.
    assert_eq!(h.controller().scroll_offset().y, mid);
}

#[test]
fn transform_begin_and_end_pair_once_per_gesture() {
    let h = harness(1000.0);
    let now = touch_pan(&h, Point::new(200.0, 500.0), Point::new(200.0, 400.0), 5, 16.0);
    assert_eq!(h.recorder.transform_begins.load(Ordering::SeqCst), 1);
    assert_eq!(h.recorder.transform_ends.load(Ordering::SeqCst), 0);

    // Slow release: stale velocity means no fling.
    h.send(InputEvent::TouchEnd { time: now + 200.0 });
    // The end is delayed by the grace window.
    assert_eq!(h.recorder.transform_ends.load(Ordering::SeqCst), 0);
    h.settle(now + 200.0);
    assert_eq!(h.recorder.transform_begins.load(Ordering::SeqCst), 1);
    assert_eq!(h.recorder.transform_ends.load(Ordering::SeqCst), 1);
}

#[test]
fn follow_up_gesture_within_grace_extends_the_transform() {
    let h = harness(2000.0);
    let now = touch_pan(&h, Point::new(200.0, 500.0), Point::new(200.0, 400.0), 5, 16.0);
    h.send(InputEvent::TouchEnd { time: now + 200.0 });

    // A second pan starts before the grace window elapses.
    let start = now + 230.0;
    h.send(InputEvent::TouchStart {
        position: Point::new(200.0, 500.0),
        time: start,
    });
    h.send(InputEvent::TouchMove {
        position: Point::new(200.0, 400.0),
        historical: Vec::new(),
        time: start + 16.0,
    });
    h.tree.update_animations(start + 400.0);
    // Still one begin, no end: the transform never lapsed.
    assert_eq!(h.recorder.transform_begins.load(Ordering::SeqCst), 1);
    assert_eq!(h.recorder.transform_ends.load(Ordering::SeqCst), 0);
    h.send(InputEvent::TouchEnd { time: start + 400.0 });
    h.settle(start + 400.0);
    assert_eq!(h.recorder.transform_ends.load(Ordering::SeqCst), 1);
}

#[test]
fn instant_wheel_jumps_and_returns_to_idle() {
    let h = harness(1000.0);
    let status = h.send(InputEvent::Wheel {
        delta: Vector::new(0.0, 40.0),
        mode: WheelDeliveryMode::Instant,
        origin: Point::new(200.0, 200.0),
        time: 10.0,
    });
    assert_eq!(status, EventStatus::Consumed);
    let controller = h.controller();
    assert_eq!(controller.scroll_offset().y, 40.0);
    assert_eq!(controller.pan_zoom_state(), PanZoomState::Idle);
    // Content saw the full state pair, not a collapsed no-op.
    let states = h.recorder.states.lock().unwrap();
    assert!(states.contains(&(PanZoomState::Idle, PanZoomState::WheelScroll)));
    assert!(states.contains(&(PanZoomState::WheelScroll, PanZoomState::Idle)));
}

#[test]
fn smooth_wheel_ticks_accumulate_into_one_animation() {
    let h = harness(1000.0);
    for i in 0..3 {
        h.send(InputEvent::Wheel {
            delta: Vector::new(0.0, 40.0),
            mode: WheelDeliveryMode::Smooth,
            origin: Point::new(200.0, 200.0),
            time: 10.0 + i as f64 * 20.0,
        });
    }
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::WheelScroll);
    h.settle(50.0);
    assert_eq!(h.controller().scroll_offset().y, 120.0);
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::Idle);
}

#[test]
fn wheel_retargets_to_next_snap_point_in_direction() {
    // A 40px tick falls far short of the snap point at 500, but snapping
    // by intended direction carries the scroll all the way there.
    let mut meta = metadata(1000.0);
    meta.snap = SnapInfo {
        x: Vec::new(),
        y: vec![
            SnapPoint { offset: 0.0, id: 7 },
            SnapPoint { offset: 500.0, id: 8 },
        ],
    };
    let h = harness_with(GlideConfig::default(), meta);
    h.send(InputEvent::Wheel {
        delta: Vector::new(0.0, 40.0),
        mode: WheelDeliveryMode::Smooth,
        origin: Point::new(200.0, 200.0),
        time: 10.0,
    });
    assert_eq!(
        h.controller().pan_zoom_state(),
        PanZoomState::SmoothMsdScroll
    );
    h.settle(10.0);
    assert!((h.controller().scroll_offset().y - 500.0).abs() < 0.1);
    let snaps = h.recorder.snaps.lock().unwrap();
    assert_eq!(snaps.as_slice(), &[SnapTargetIds {
        x: None,
        y: Some(8),
    }]);
}

#[test]
fn wheel_past_the_range_springs_back() {
    // Wheel events have no release; overscroll from an overshooting tick
    // must spring back on its own rather than hang around waiting for an
    // end event that never comes.
    let h = harness(700.0);
    h.send(InputEvent::Wheel {
        delta: Vector::new(0.0, 500.0),
        mode: WheelDeliveryMode::Instant,
        origin: Point::new(200.0, 200.0),
        time: 10.0,
    });
    let controller = h.controller();
    assert_eq!(controller.scroll_offset().y, 300.0);
    assert!(controller.overscroll().y > 0.0);
    assert_eq!(
        controller.pan_zoom_state(),
        PanZoomState::OverscrollAnimation
    );

    let end = h.settle(10.0);
    assert!(!controller.is_overscrolled());
    assert_eq!(controller.pan_zoom_state(), PanZoomState::Idle);
    // The engine stops asking for frames once the spring settles.
    assert!(!h.tree.update_animations(end + 16.0));
}

#[test]
fn keyboard_scroll_past_the_bottom_springs_back() {
    let h = harness(700.0);
    h.send(InputEvent::KeyboardScroll {
        action: KeyboardScrollAction {
            unit: ScrollUnit::Whole,
            forward: true,
            horizontal: false,
        },
        time: 10.0,
    });
    let now = h.settle(10.0);
    assert_eq!(h.controller().scroll_offset().y, 300.0);

    // Another page press at the bottom lands as overscroll; the spring
    // starts as soon as the (zero-distance) scroll animation ends.
    h.send(InputEvent::KeyboardScroll {
        action: KeyboardScrollAction {
            unit: ScrollUnit::Page,
            forward: true,
            horizontal: false,
        },
        time: now + 16.0,
    });
    assert!(h.controller().overscroll().y > 0.0);
    let end = h.settle(now + 16.0);
    assert!(!h.controller().is_overscrolled());
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::Idle);
    assert_eq!(h.controller().scroll_offset().y, 300.0);
    assert!(!h.tree.update_animations(end + 16.0));
}

#[test]
fn keyboard_page_scroll_animates_by_a_page() {
    let h = harness(2000.0);
    h.send(InputEvent::KeyboardScroll {
        action: KeyboardScrollAction {
            unit: ScrollUnit::Page,
            forward: true,
            horizontal: false,
        },
        time: 10.0,
    });
    assert_eq!(
        h.controller().pan_zoom_state(),
        PanZoomState::KeyboardScroll
    );
    h.settle(10.0);
    // One page is the viewport height times the page fraction.
    assert!((h.controller().scroll_offset().y - 360.0).abs() < 0.5);
}

#[test]
fn keyboard_end_scrolls_to_the_bottom() {
    let h = harness(2000.0);
    h.send(InputEvent::KeyboardScroll {
        action: KeyboardScrollAction {
            unit: ScrollUnit::Whole,
            forward: true,
            horizontal: false,
        },
        time: 10.0,
    });
    h.settle(10.0);
    assert_eq!(h.controller().scroll_offset().y, 1600.0);
}

#[test]
fn equal_span_pinch_still_scrolls_by_focus_delta() {
    let h = harness(1000.0);
    h.send(InputEvent::PinchStart {
        focus: Point::new(200.0, 200.0),
        time: 0.0,
    });
    h.send(InputEvent::PinchUpdate {
        focus: Point::new(200.0, 150.0),
        current_span: 100.0,
        previous_span: 100.0,
        time: 16.0,
    });
    let controller = h.controller();
    assert_eq!(controller.zoom(), 1.0);
    assert_eq!(controller.scroll_offset().y, 50.0);
    h.send(InputEvent::PinchEnd {
        finger_lifted: false,
        focus: Point::new(200.0, 150.0),
        time: 32.0,
    });
    h.settle(32.0);
    assert_eq!(controller.pan_zoom_state(), PanZoomState::Idle);
}

#[test]
fn pinch_zoom_scales_and_extends_the_scroll_range() {
    let mut config = GlideConfig::default();
    config.pinch_lock_mode = PinchLockMode::Free;
    let h = harness_with(config, metadata(1000.0));
    h.send(InputEvent::PinchStart {
        focus: Point::new(200.0, 200.0),
        time: 0.0,
    });
    h.send(InputEvent::PinchUpdate {
        focus: Point::new(200.0, 200.0),
        current_span: 200.0,
        previous_span: 100.0,
        time: 16.0,
    });
    let controller = h.controller();
    assert!((controller.zoom() - 2.0).abs() < 1e-4);
    h.send(InputEvent::PinchEnd {
        finger_lifted: false,
        focus: Point::new(200.0, 200.0),
        time: 32.0,
    });
    // At 2x zoom half the viewport height of content is visible, so the
    // scrollable remainder grows accordingly.
    h.send(InputEvent::KeyboardScroll {
        action: KeyboardScrollAction {
            unit: ScrollUnit::Whole,
            forward: true,
            horizontal: false,
        },
        time: 48.0,
    });
    h.settle(48.0);
    assert_eq!(controller.scroll_offset().y, 800.0);
}

#[test]
fn focus_travel_locks_the_pinch_against_zooming() {
    // Default Standard pinch lock: moving the focus before changing the
    // span decides the gesture as a scroll for its remainder.
    let h = harness(1000.0);
    h.send(InputEvent::PinchStart {
        focus: Point::new(200.0, 200.0),
        time: 0.0,
    });
    h.send(InputEvent::PinchUpdate {
        focus: Point::new(200.0, 150.0),
        current_span: 100.0,
        previous_span: 100.0,
        time: 16.0,
    });
    h.send(InputEvent::PinchUpdate {
        focus: Point::new(200.0, 140.0),
        current_span: 200.0,
        previous_span: 100.0,
        time: 32.0,
    });
    assert_eq!(h.controller().zoom(), 1.0);
}

#[test]
fn double_tap_zooms_in_then_back_out() {
    let mut config = GlideConfig::default();
    config.pinch_lock_mode = PinchLockMode::Free;
    let h = harness_with(config, metadata(1000.0));
    let status = h.send(InputEvent::Tap {
        kind: TapKind::Double,
        position: Point::new(200.0, 200.0),
        time: 10.0,
    });
    assert_eq!(status, EventStatus::Consumed);
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::AnimatingZoom);
    h.settle(10.0);
    assert!((h.controller().zoom() - 2.0).abs() < 1e-4);

    h.send(InputEvent::Tap {
        kind: TapKind::Double,
        position: Point::new(200.0, 200.0),
        time: 2000.0,
    });
    h.settle(2000.0);
    assert!((h.controller().zoom() - 1.0).abs() < 1e-4);
}

#[test]
fn single_tap_is_left_to_the_embedder() {
    let h = harness(1000.0);
    let status = h.send(InputEvent::Tap {
        kind: TapKind::Single,
        position: Point::new(200.0, 200.0),
        time: 10.0,
    });
    assert_eq!(status, EventStatus::DefaultAction);
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::Idle);
}

#[test]
fn scrollbar_drag_tracks_the_thumb() {
    let h = harness(1000.0);
    h.send(InputEvent::ScrollbarDragStart {
        vertical: true,
        time: 0.0,
    });
    h.send(InputEvent::ScrollbarDragUpdate {
        thumb_fraction: 0.5,
        time: 16.0,
    });
    assert_eq!(h.controller().scroll_offset().y, 300.0);
    h.send(InputEvent::ScrollbarDragEnd { time: 32.0 });
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::Idle);
}

#[test]
fn autoscroll_drifts_toward_the_pointer() {
    let h = harness(2000.0);
    h.send(InputEvent::AutoscrollStart {
        anchor: Point::new(200.0, 200.0),
        time: 0.0,
    });
    h.send(InputEvent::AutoscrollUpdate {
        position: Point::new(200.0, 300.0),
        time: 16.0,
    });
    for i in 1..=20 {
        h.tree.update_animations(i as f64 * 16.0);
    }
    assert!(h.controller().scroll_offset().y > 0.0);
    h.send(InputEvent::AutoscrollStop { time: 400.0 });
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::Idle);
}

#[test]
fn compositor_samples_lag_input_by_one_frame() {
    let h = harness(1000.0);
    let controller = h.controller();
    h.tree.update_animations(0.0);
    h.send(InputEvent::Wheel {
        delta: Vector::new(0.0, 40.0),
        mode: WheelDeliveryMode::Instant,
        origin: Point::new(200.0, 200.0),
        time: 10.0,
    });
    h.tree.update_animations(16.0);

    let (first, _) = controller.sample_for_composite();
    assert_eq!(first.scroll_offset.y, 0.0);
    let (second, _) = controller.sample_for_composite();
    assert_eq!(second.scroll_offset.y, 40.0);
}

#[test]
fn invalid_metadata_update_is_rejected_and_state_kept() {
    let h = harness(1000.0);
    h.send(InputEvent::Wheel {
        delta: Vector::new(0.0, 40.0),
        mode: WheelDeliveryMode::Instant,
        origin: Point::new(200.0, 200.0),
        time: 10.0,
    });
    let mut bad = metadata(1000.0);
    bad.zoom = f32::NAN;
    assert!(h.tree.notify_layers_updated(1, bad, false, false, 20.0).is_err());
    assert_eq!(h.controller().scroll_offset().y, 40.0);
}

#[test]
fn relative_metadata_update_preserves_async_scrolling() {
    let h = harness(1000.0);
    h.send(InputEvent::Wheel {
        delta: Vector::new(0.0, 40.0),
        mode: WheelDeliveryMode::Instant,
        origin: Point::new(200.0, 200.0),
        time: 10.0,
    });
    // Content scrolled itself by 100 on top of whatever we did async.
    let mut update = metadata(1000.0);
    update.scroll_offset = Point::new(0.0, 100.0);
    update.generation = 2;
    h.tree
        .notify_layers_updated(1, update, false, true, 20.0)
        .unwrap();
    assert_eq!(h.controller().scroll_offset().y, 140.0);
}

#[test]
fn disregarded_direction_overscrolls_without_scrolling() {
    // A single-line input refuses vertical scrolling: pan displacement
    // along that axis becomes overscroll immediately and springs back.
    let mut meta = metadata(1000.0);
    meta.disregarded_direction = Some(ScrollDirection::Vertical);
    let h = harness_with(GlideConfig::default(), meta);
    let now = touch_pan(&h, Point::new(200.0, 400.0), Point::new(200.0, 300.0), 5, 16.0);
    let controller = h.controller();
    assert_eq!(controller.scroll_offset().y, 0.0);
    assert!(controller.overscroll().y > 0.0);

    h.send(InputEvent::TouchEnd { time: now + 200.0 });
    h.settle(now + 200.0);
    assert!(!controller.is_overscrolled());
    assert_eq!(controller.scroll_offset().y, 0.0);
}

#[test]
fn sideways_drift_in_a_vertical_pan_stays_out_of_overscroll() {
    // Free axis lock so the slight horizontal component is not zeroed by
    // the lock; Contain on x so its remainder would land locally.
    let mut config = GlideConfig::default();
    config.axis_lock_mode = AxisLockMode::Free;
    let mut meta = metadata(700.0);
    meta.overscroll_behavior_x = OverscrollBehavior::Contain;
    let h = harness_with(config, meta);

    let now = touch_pan(&h, Point::new(230.0, 550.0), Point::new(200.0, 50.0), 5, 16.0);
    let controller = h.controller();
    // The dominant axis exhausts its range and overscrolls as usual.
    assert_eq!(controller.scroll_offset().y, 300.0);
    assert!(controller.overscroll().y > 0.0);
    // The 30px of sideways drift never stretches the unscrollable x axis.
    assert_eq!(controller.overscroll().x, 0.0);

    h.send(InputEvent::TouchEnd { time: now + 16.0 });
    h.settle(now + 16.0);
    assert!(!controller.is_overscrolled());
}

#[test]
fn overscroll_reports_which_edges_are_stretched() {
    let h = harness(700.0);
    let now = touch_pan(&h, Point::new(200.0, 550.0), Point::new(200.0, 50.0), 5, 16.0);
    let controller = h.controller();
    let (transform, _) = controller.sample_for_composite();
    assert!(transform.overscroll.y > 0.0);
    assert!(transform.overscroll_sides.contains(SideBits::BOTTOM));
    assert!(!transform.overscroll_sides.contains(SideBits::TOP));

    h.send(InputEvent::TouchEnd { time: now + 16.0 });
    h.settle(now + 16.0);
    let (transform, _) = controller.sample_for_composite();
    assert!(transform.overscroll_sides.is_empty());
}

#[test]
fn stray_gesture_continuations_are_dropped() {
    let h = harness(1000.0);
    assert_eq!(
        h.send(InputEvent::TouchEnd { time: 10.0 }),
        EventStatus::Ignored
    );
    assert_eq!(
        h.send(InputEvent::PinchUpdate {
            focus: Point::new(200.0, 200.0),
            current_span: 200.0,
            previous_span: 100.0,
            time: 20.0,
        }),
        EventStatus::Ignored
    );
    assert_eq!(h.controller().pan_zoom_state(), PanZoomState::Idle);
    assert_eq!(h.controller().zoom(), 1.0);
}

#[test]
fn repaints_are_requested_for_user_input() {
    let h = harness(1000.0);
    touch_pan(&h, Point::new(200.0, 500.0), Point::new(200.0, 300.0), 5, 16.0);
    assert!(h.recorder.repaints.load(Ordering::SeqCst) > 0);
}
