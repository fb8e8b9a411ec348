use super::*;
use crate::geometry::Point;
use crate::window::WindowTree;

fn touch(event_type: EventType, x: i32, y: i32, touch_id: u32, ms: u64) -> TouchEvent {
    TouchEvent::new(event_type, Point::new(x, y), touch_id, Duration::from_millis(ms))
}

fn types(events: &[GestureEvent]) -> Vec<EventType> {
    events.iter().map(|g| g.event_type).collect()
}

fn sequence() -> GestureSequence {
    GestureSequence::new(GestureConfig::default())
}

fn feed(seq: &mut GestureSequence, event: TouchEvent) -> Vec<GestureEvent> {
    seq.process_touch_event(&event, TouchStatus::Unknown)
}

fn window() -> WindowId {
    let mut tree = WindowTree::new();
    tree.create(None)
}

#[test]
fn press_and_release_is_a_tap() {
    let mut seq = sequence();
    let down = feed(&mut seq, touch(EventType::TouchPressed, 10, 10, 0, 0));
    assert_eq!(types(&down), vec![EventType::GestureTapDown]);
    assert_eq!(down[0].touch_ids_bitfield, 1);
    assert_eq!(seq.state(), GestureState::PendingSyntheticClick);
    assert!(seq.take_long_press_request());

    let up = feed(&mut seq, touch(EventType::TouchReleased, 12, 11, 0, 50));
    assert_eq!(types(&up), vec![EventType::GestureTap]);
    assert_eq!(up[0].location, Point::new(10, 10));
    assert_eq!(seq.state(), GestureState::NoGesture);
    assert_eq!(seq.point_count(), 0);
}

#[test]
fn second_tap_nearby_is_a_double_tap() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 10, 10, 0, 0));
    feed(&mut seq, touch(EventType::TouchReleased, 10, 10, 0, 50));
    feed(&mut seq, touch(EventType::TouchPressed, 14, 12, 0, 200));
    let up = feed(&mut seq, touch(EventType::TouchReleased, 14, 12, 0, 250));
    assert_eq!(types(&up), vec![EventType::GestureTap, EventType::GestureDoubleTap]);
}

#[test]
fn slow_second_tap_is_not_a_double_tap() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 10, 10, 0, 0));
    feed(&mut seq, touch(EventType::TouchReleased, 10, 10, 0, 50));
    feed(&mut seq, touch(EventType::TouchPressed, 10, 10, 0, 900));
    let up = feed(&mut seq, touch(EventType::TouchReleased, 10, 10, 0, 950));
    assert_eq!(types(&up), vec![EventType::GestureTap]);
}

#[test]
fn too_short_or_too_long_press_is_not_a_tap() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 10, 10, 0, 0));
    assert!(feed(&mut seq, touch(EventType::TouchReleased, 10, 10, 0, 5)).is_empty());

    feed(&mut seq, touch(EventType::TouchPressed, 10, 10, 0, 1000));
    assert!(feed(&mut seq, touch(EventType::TouchReleased, 10, 10, 0, 1900)).is_empty());
    assert_eq!(seq.state(), GestureState::NoGesture);
}

#[test]
fn horizontal_drag_scrolls_on_the_rail() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 0, 0, 0, 0));

    let start = feed(&mut seq, touch(EventType::TouchMoved, 30, 0, 0, 100));
    assert_eq!(
        types(&start),
        vec![EventType::GestureScrollBegin, EventType::GestureScrollUpdate]
    );
    assert_eq!(start[0].location, Point::new(0, 0));
    assert_eq!((start[1].delta_x, start[1].delta_y), (30.0, 0.0));
    assert_eq!(seq.state(), GestureState::Scroll);
    assert_eq!(seq.scroll_type(), ScrollType::Horizontal);

    // The small vertical drift is swallowed by the rail.
    let update = feed(&mut seq, touch(EventType::TouchMoved, 50, 5, 0, 150));
    assert_eq!(types(&update), vec![EventType::GestureScrollUpdate]);
    assert_eq!((update[0].delta_x, update[0].delta_y), (20.0, 0.0));

    let end = feed(&mut seq, touch(EventType::TouchReleased, 50, 5, 0, 160));
    assert_eq!(types(&end), vec![EventType::GestureScrollEnd]);
    assert_eq!((end[0].delta_x, end[0].delta_y), (0.0, 0.0));
    assert_eq!(seq.state(), GestureState::NoGesture);
}

#[test]
fn fast_release_is_a_flick() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 0, 0, 0, 0));
    feed(&mut seq, touch(EventType::TouchMoved, 100, 0, 0, 50));
    feed(&mut seq, touch(EventType::TouchMoved, 200, 0, 0, 100));
    let end = feed(&mut seq, touch(EventType::TouchReleased, 200, 0, 0, 100));
    assert_eq!(types(&end), vec![EventType::GestureScrollEnd]);
    assert!((end[0].delta_x - 2000.0).abs() < 1.0);
    assert_eq!(end[0].delta_y, 0.0);
}

#[test]
fn cancelled_scroll_never_flicks() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 0, 0, 0, 0));
    feed(&mut seq, touch(EventType::TouchMoved, 100, 0, 0, 50));
    feed(&mut seq, touch(EventType::TouchMoved, 200, 0, 0, 100));
    let end = feed(&mut seq, touch(EventType::TouchCancelled, 200, 0, 0, 100));
    assert_eq!(types(&end), vec![EventType::GestureScrollEnd]);
    assert_eq!(end[0].delta_x, 0.0);
}

#[test]
fn two_fingers_pinch() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 0, 0, 0, 0));

    let begin = feed(&mut seq, touch(EventType::TouchPressed, 100, 0, 1, 10));
    assert_eq!(
        types(&begin),
        vec![
            EventType::GestureTapDown,
            EventType::GesturePinchBegin,
            EventType::GestureScrollBegin
        ]
    );
    assert_eq!(begin[0].location, Point::new(100, 0));
    assert_eq!(begin[1].location, Point::new(50, 0));
    assert_eq!(begin[1].touch_ids_bitfield, 0b11);
    assert_eq!(seq.state(), GestureState::Pinch);

    let update = feed(&mut seq, touch(EventType::TouchMoved, 200, 0, 1, 20));
    assert_eq!(types(&update), vec![EventType::GesturePinchUpdate]);
    assert_eq!(update[0].delta_x, 2.0);
    assert_eq!(update[0].location, Point::new(100, 0));

    let end = feed(&mut seq, touch(EventType::TouchReleased, 200, 0, 1, 30));
    assert_eq!(types(&end), vec![EventType::GesturePinchEnd]);
    assert_eq!(end[0].delta_x, 2.0);
    assert_eq!(seq.state(), GestureState::Scroll);
    assert_eq!(seq.point_count(), 1);
}

#[test]
fn releasing_a_finger_compacts_point_ids() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 0, 0, 3, 0));
    feed(&mut seq, touch(EventType::TouchPressed, 100, 0, 5, 10));
    assert_eq!(seq.point_count(), 2);

    // Lifting the first finger makes the second one point 0.
    feed(&mut seq, touch(EventType::TouchReleased, 0, 0, 3, 20));
    assert_eq!(seq.point_count(), 1);
    assert_eq!(seq.state(), GestureState::Scroll);
    let update = feed(&mut seq, touch(EventType::TouchMoved, 100, 40, 5, 30));
    assert_eq!(types(&update), vec![EventType::GestureScrollUpdate]);
    assert_eq!(update[0].touch_ids_bitfield, 1 << 5);
}

#[test]
fn out_of_range_or_consumed_touches_are_ignored() {
    let mut seq = sequence();
    assert!(feed(&mut seq, touch(EventType::TouchPressed, 0, 0, 12, 0)).is_empty());
    assert_eq!(seq.point_count(), 0);

    let consumed = touch(EventType::TouchPressed, 0, 0, 0, 0);
    assert!(seq.process_touch_event(&consumed, TouchStatus::Start).is_empty());
    assert_eq!(seq.state(), GestureState::NoGesture);
}

#[test]
fn cancel_while_pending_resets() {
    let mut seq = sequence();
    feed(&mut seq, touch(EventType::TouchPressed, 0, 0, 0, 0));
    assert!(feed(&mut seq, touch(EventType::TouchCancelled, 0, 0, 0, 20)).is_empty());
    assert_eq!(seq.state(), GestureState::NoGesture);
    assert_eq!(seq.point_count(), 0);
}

#[test]
fn velocity_needs_a_full_buffer() {
    let mut velocity = VelocityCalculator::new(3);
    velocity.point_seen(0, 0, 0);
    velocity.point_seen(10, 20, 10_000);
    assert_eq!(velocity.velocity(), (0.0, 0.0));

    velocity.point_seen(20, 40, 20_000);
    let (vx, vy) = velocity.velocity();
    assert!((vx - 1000.0).abs() < 0.5);
    assert!((vy - 2000.0).abs() < 0.5);

    velocity.clear_history();
    assert_eq!(velocity.velocity_squared(), 0.0);
}

#[test]
fn recognizer_routes_touch_ids_to_their_target() {
    let target = window();
    let mut recognizer = GestureRecognizer::new(GestureConfig::default());
    let press = touch(EventType::TouchPressed, 5, 5, 2, 0);
    assert_eq!(recognizer.target_for_touch_event(&press), None);

    let out = recognizer.process_touch_event_for_gesture(&press, TouchStatus::Unknown, target);
    assert_eq!(types(&out.events), vec![EventType::GestureTapDown]);
    assert_eq!(recognizer.target_for_touch_event(&press), Some(target));
    assert_eq!(recognizer.target_for_gesture_event(&out.events[0]), Some(target));

    let release = touch(EventType::TouchReleased, 5, 5, 2, 40);
    recognizer.process_touch_event_for_gesture(&release, TouchStatus::Unknown, target);
    assert_eq!(recognizer.target_for_touch_event(&release), None);
    // Gesture routing survives the release so a late tap still lands.
    assert_eq!(recognizer.target_for_gesture_event(&out.events[0]), Some(target));
}

#[test]
fn long_press_fires_only_while_pending() {
    let target = window();
    let mut recognizer = GestureRecognizer::new(GestureConfig::default());
    let out = recognizer.process_touch_event_for_gesture(
        &touch(EventType::TouchPressed, 7, 8, 0, 0),
        TouchStatus::Unknown,
        target,
    );
    let timer = out.long_press.expect("touch down arms a long press");
    assert_eq!(timer.window, target);
    assert_eq!(timer.delay, Duration::from_secs(1));

    assert_eq!(recognizer.long_press(target, timer.token + 1), None);
    let fired = recognizer.long_press(target, timer.token).expect("long press");
    assert_eq!(fired.event_type, EventType::GestureLongPress);
    assert_eq!(fired.location, Point::new(7, 8));
    // A timer fires once.
    assert_eq!(recognizer.long_press(target, timer.token), None);
}

#[test]
fn release_disarms_long_press() {
    let target = window();
    let mut recognizer = GestureRecognizer::new(GestureConfig::default());
    let out = recognizer.process_touch_event_for_gesture(
        &touch(EventType::TouchPressed, 7, 8, 0, 0),
        TouchStatus::Unknown,
        target,
    );
    let timer = out.long_press.expect("touch down arms a long press");
    recognizer.process_touch_event_for_gesture(
        &touch(EventType::TouchReleased, 7, 8, 0, 50),
        TouchStatus::Unknown,
        target,
    );
    assert_eq!(recognizer.long_press(target, timer.token), None);
}

#[test]
fn queued_touches_replay_in_order() {
    let target = window();
    let mut recognizer = GestureRecognizer::new(GestureConfig::default());
    recognizer.queue_touch_event_for_gesture(target, &touch(EventType::TouchPressed, 1, 1, 0, 0));
    recognizer.queue_touch_event_for_gesture(target, &touch(EventType::TouchReleased, 1, 1, 0, 50));
    assert_eq!(recognizer.queued_touch_events(target), 2);

    let first = recognizer.advance_touch_queue(target, false);
    assert_eq!(types(&first.events), vec![EventType::GestureTapDown]);
    // Consumed touches do not produce gestures.
    let second = recognizer.advance_touch_queue(target, true);
    assert!(second.events.is_empty());
    assert_eq!(recognizer.queued_touch_events(target), 0);

    assert!(recognizer.advance_touch_queue(target, false).is_empty());
}

#[test]
fn flush_forgets_the_window() {
    let target = window();
    let mut recognizer = GestureRecognizer::new(GestureConfig::default());
    let press = touch(EventType::TouchPressed, 1, 1, 0, 0);
    let out = recognizer.process_touch_event_for_gesture(&press, TouchStatus::Unknown, target);
    recognizer.queue_touch_event_for_gesture(target, &touch(EventType::TouchMoved, 2, 2, 0, 10));

    recognizer.flush_touch_queue(target);
    assert!(recognizer.sequence(target).is_none());
    assert_eq!(recognizer.queued_touch_events(target), 0);
    assert_eq!(recognizer.target_for_touch_event(&press), None);
    assert_eq!(recognizer.target_for_gesture_event(&out.events[0]), None);
}
