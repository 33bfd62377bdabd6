use super::*;
use crate::{
    animation::animator::{AnimatorCommand, RecordingAnimator},
    foundation::core::Point,
};

fn session_json(extra: &str) -> String {
    format!(
        r#"{{
            "canvas": {{"width": 320, "height": 240}},
            "config": {{"renderImageBuffer": 50}},
            "images": ["a.png", "b.png"]
            {extra}
        }}"#
    )
}

#[test]
fn minimal_session_parses_with_defaults() {
    let s: Session = serde_json::from_str(&session_json("")).unwrap();
    s.validate().unwrap();
    assert!(s.samples.is_empty());
    assert_eq!(s.end_time(), TimeMs(5500));
}

#[test]
fn unsorted_samples_are_rejected() {
    let s: Session = serde_json::from_str(&session_json(
        r#", "samples": [{"x": 0, "y": 0, "t_ms": 10}, {"x": 0, "y": 0, "t_ms": 5}]"#,
    ))
    .unwrap();
    assert!(s.validate().is_err());
}

#[test]
fn early_end_is_rejected() {
    let s: Session = serde_json::from_str(&session_json(
        r#", "samples": [{"x": 0, "y": 0, "t_ms": 10}], "end_ms": 5"#,
    ))
    .unwrap();
    assert!(s.validate().is_err());
}

#[test]
fn replay_reports_triggers_and_unmounts() {
    let s: Session = serde_json::from_str(&session_json(
        r#", "samples": [
            {"x": 0, "y": 60, "t_ms": 0},
            {"x": 0, "y": 65, "t_ms": 16},
            {"x": 0, "y": 130, "t_ms": 32}
        ]"#,
    ))
    .unwrap();
    let (anim, report) = s.replay(RecordingAnimator::new()).unwrap();

    let slots: Vec<usize> = report.triggers.iter().map(|t| t.slot).collect();
    assert_eq!(slots, vec![0, 1]);
    assert_eq!(report.end, TimeMs(32 + 5000 + 500));
    // Both images ran their full course: 2 entrances + 2 exits.
    assert_eq!(anim.requests().count(), 4);
}

#[test]
fn updates_apply_before_same_time_samples() {
    let s: Session = serde_json::from_str(&session_json(
        r#", "samples": [
            {"x": 100, "y": 0, "t_ms": 0},
            {"x": 200, "y": 0, "t_ms": 100}
        ],
        "updates": [{"at_ms": 100, "images": ["z.png"]}]"#,
    ))
    .unwrap();
    let (anim, report) = s.replay(RecordingAnimator::new()).unwrap();
    assert_eq!(report.triggers[1].image.as_str(), "z.png");
    assert_eq!(report.triggers[1].slot, 0);
    assert!(
        anim.commands
            .iter()
            .any(|c| matches!(c, AnimatorCommand::Release { slot: 1, .. }))
    );
}

#[test]
fn clearing_images_silences_the_trail() {
    let s: Session = serde_json::from_str(&session_json(
        r#", "samples": [
            {"x": 100, "y": 0, "t_ms": 0},
            {"x": 200, "y": 0, "t_ms": 100},
            {"x": 300, "y": 0, "t_ms": 200}
        ],
        "updates": [{"at_ms": 50, "images": []}]"#,
    ))
    .unwrap();
    let (_, report) = s.replay(RecordingAnimator::new()).unwrap();
    assert_eq!(report.triggers.len(), 1);
}

#[test]
fn samples_off_the_surface_are_not_heard() {
    let s: Session = serde_json::from_str(&session_json(
        r#", "samples": [
            {"x": 100, "y": 100, "t_ms": 0},
            {"x": 400, "y": 100, "t_ms": 10},
            {"x": -80, "y": 100, "t_ms": 20},
            {"x": 100, "y": 180, "t_ms": 30}
        ]"#,
    ))
    .unwrap();
    let (_, report) = s.replay(RecordingAnimator::new()).unwrap();
    let at: Vec<TimeMs> = report.triggers.iter().map(|t| t.at).collect();
    assert_eq!(at, vec![TimeMs(0), TimeMs(30)]);
    assert_eq!(report.triggers[1].position, Point::new(100.0, 180.0));
}
