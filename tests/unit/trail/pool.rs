use super::*;
use crate::animation::animator::{AnimatorCommand, RecordingAnimator};

fn images(n: usize) -> Vec<ImageRef> {
    (0..n).map(|i| ImageRef::new(format!("img{i}.png"))).collect()
}

#[test]
fn empty_pool_resolves_nothing() {
    let pool = SlotPool::new(&[]);
    assert!(pool.is_empty());
    assert!(pool.resolve_slot(0).is_none());
}

#[test]
fn one_slot_per_image_with_fixed_indices() {
    let pool = SlotPool::new(&images(3));
    assert_eq!(pool.len(), 3);
    for (i, slot) in pool.slots().iter().enumerate() {
        assert_eq!(slot.index(), i);
        assert_eq!(slot.bound_image().as_str(), format!("img{i}.png"));
        assert_eq!(slot.state(), AnimationState::Idle);
    }
}

#[test]
fn placement_is_immediate_and_unanimated() {
    let mut pool = SlotPool::new(&images(2));
    let mut anim = RecordingAnimator::new();
    pool.apply_placement(1, Point::new(3.0, 4.0), 9, TimeMs(12), &mut anim);

    let slot = pool.resolve_slot(1).unwrap();
    assert_eq!(slot.position(), Point::new(3.0, 4.0));
    assert_eq!(slot.stack_order(), 9);
    assert_eq!(anim.commands.len(), 1);
    assert!(matches!(
        anim.commands[0],
        AnimatorCommand::Place {
            slot: 1,
            stack_order: 9,
            ..
        }
    ));
    assert_eq!(anim.requests().count(), 0);
}

#[test]
fn entrance_rotation_sign_follows_slot_parity() {
    let cfg = TrailConfig::default();
    let mut pool = SlotPool::new(&images(4));
    let mut anim = RecordingAnimator::new();
    for i in 0..4 {
        pool.run_entrance(i, 10.0, TimeMs(0), &cfg, &mut anim);
    }
    let starts: Vec<f64> = anim
        .requests()
        .map(|r| r.transform.unwrap().from.rotation_deg)
        .collect();
    assert_eq!(starts, vec![-10.0, 10.0, -10.0, 10.0]);

    let ends: Vec<f64> = anim
        .requests()
        .map(|r| r.transform.unwrap().to.rotation_deg)
        .collect();
    assert_eq!(ends, vec![10.0, -10.0, 10.0, -10.0]);
}

#[test]
fn upright_settle_ends_at_zero() {
    let cfg = TrailConfig {
        rotation_settle: RotationSettle::Upright,
        ..TrailConfig::default()
    };
    let mut pool = SlotPool::new(&images(1));
    let mut anim = RecordingAnimator::new();
    pool.run_entrance(0, 12.0, TimeMs(0), &cfg, &mut anim);
    let req = anim.requests().next().unwrap();
    assert_eq!(req.transform.unwrap().to.rotation_deg, 0.0);
}

#[test]
fn entrance_request_shape() {
    let cfg = TrailConfig::default();
    let mut pool = SlotPool::new(&images(1));
    let mut anim = RecordingAnimator::new();
    pool.run_entrance(0, 0.0, TimeMs(100), &cfg, &mut anim);

    let req = anim.requests().next().unwrap();
    assert_eq!(req.phase, AnimationPhase::Entrance);
    assert_eq!(req.start, TimeMs(100));
    assert_eq!(req.duration_ms, 300);
    assert_eq!(req.opacity, Tween::new(0.0, 1.0));
    let tw = req.transform.unwrap();
    assert_eq!(tw.from.scale, 0.5);
    assert_eq!(tw.to.scale, 1.0);
    assert_eq!(tw.to.offset, Vec2::new(-0.5, -0.5));
    assert_eq!(pool.resolve_slot(0).unwrap().state(), AnimationState::Entering);
}

#[test]
fn state_machine_walks_through_all_phases() {
    let cfg = TrailConfig::default();
    let mut pool = SlotPool::new(&images(1));
    let mut anim = RecordingAnimator::new();

    pool.run_entrance(0, 5.0, TimeMs(0), &cfg, &mut anim);
    pool.schedule_exit(0, TimeMs(5000));
    assert_eq!(pool.pending_timers(), 2);

    let (due, task) = pool.pop_due(TimeMs(10_000)).unwrap();
    assert_eq!((due, task.kind), (TimeMs(300), SlotTaskKind::Settle));
    pool.settle(0);
    assert_eq!(pool.slots()[0].state(), AnimationState::Visible);

    let (due, task) = pool.pop_due(TimeMs(10_000)).unwrap();
    assert_eq!((due, task.kind), (TimeMs(5000), SlotTaskKind::ExitStart));
    pool.run_exit(0, due, &cfg, &mut anim);
    assert_eq!(pool.slots()[0].state(), AnimationState::Exiting);

    let (due, task) = pool.pop_due(TimeMs(10_000)).unwrap();
    assert_eq!((due, task.kind), (TimeMs(5500), SlotTaskKind::ExitDone));
    pool.finish_exit(0);
    assert_eq!(pool.slots()[0].state(), AnimationState::Idle);
    assert_eq!(pool.pending_timers(), 0);

    let exit = anim.requests().last().unwrap();
    assert_eq!(exit.phase, AnimationPhase::Exit);
    assert_eq!(exit.start, TimeMs(5000));
    assert_eq!(exit.ease, crate::animation::ease::Ease::Linear);
}

#[test]
fn cancel_pending_drops_timers_and_notifies_animator() {
    let cfg = TrailConfig::default();
    let mut pool = SlotPool::new(&images(1));
    let mut anim = RecordingAnimator::new();
    pool.run_entrance(0, 5.0, TimeMs(0), &cfg, &mut anim);
    pool.schedule_exit(0, TimeMs(5000));

    pool.cancel_pending(0, TimeMs(40), &mut anim);
    assert_eq!(pool.pending_timers(), 0);
    assert!(pool.pop_due(TimeMs(u64::MAX)).is_none());
    assert!(matches!(
        anim.commands.last(),
        Some(AnimatorCommand::Cancel {
            at: TimeMs(40),
            slot: 0
        })
    ));
}

#[test]
fn cancel_on_idle_slot_is_silent() {
    let mut pool = SlotPool::new(&images(1));
    let mut anim = RecordingAnimator::new();
    pool.cancel_pending(0, TimeMs(0), &mut anim);
    assert!(anim.commands.is_empty());
}

#[test]
fn exit_on_idle_slot_is_ignored() {
    let cfg = TrailConfig::default();
    let mut pool = SlotPool::new(&images(1));
    let mut anim = RecordingAnimator::new();
    pool.run_exit(0, TimeMs(0), &cfg, &mut anim);
    assert!(anim.commands.is_empty());
    assert_eq!(pool.pending_timers(), 0);
}

#[test]
fn resize_rebinds_grows_and_shrinks() {
    let cfg = TrailConfig::default();
    let mut pool = SlotPool::new(&images(3));
    let mut anim = RecordingAnimator::new();
    pool.run_entrance(2, 1.0, TimeMs(0), &cfg, &mut anim);
    pool.schedule_exit(2, TimeMs(5000));

    let mut next = images(2);
    next[0] = ImageRef::new("fresh.png");
    pool.resize(&next, TimeMs(50), &mut anim);
    assert_eq!(pool.len(), 2);
    assert_eq!(pool.slots()[0].bound_image().as_str(), "fresh.png");
    assert_eq!(pool.pending_timers(), 0);
    assert!(
        anim.commands
            .iter()
            .any(|c| matches!(c, AnimatorCommand::Release { slot: 2, .. }))
    );
    // The renderer hears about the new image straight away.
    assert!(matches!(
        anim.commands.last(),
        Some(AnimatorCommand::Rebind { slot: 0, image, .. }) if image.as_str() == "fresh.png"
    ));
    let rebinds = |a: &RecordingAnimator| {
        a.commands
            .iter()
            .filter(|c| matches!(c, AnimatorCommand::Rebind { .. }))
            .count()
    };
    assert_eq!(rebinds(&anim), 1);

    pool.resize(&images(5), TimeMs(60), &mut anim);
    assert_eq!(pool.len(), 5);
    assert_eq!(pool.slots()[4].index(), 4);
    assert_eq!(pool.slots()[0].bound_image().as_str(), "img0.png");
    // Only slot 0 changed image; the new slots start idle without a rebind.
    assert_eq!(rebinds(&anim), 2);
}

#[test]
fn cancel_all_idles_every_slot() {
    let cfg = TrailConfig::default();
    let mut pool = SlotPool::new(&images(3));
    let mut anim = RecordingAnimator::new();
    for i in 0..3 {
        pool.run_entrance(i, 1.0, TimeMs(0), &cfg, &mut anim);
        pool.schedule_exit(i, TimeMs(5000));
    }
    pool.cancel_all(TimeMs(1), &mut anim);
    assert_eq!(pool.pending_timers(), 0);
    assert!(
        pool.slots()
            .iter()
            .all(|s| s.state() == AnimationState::Idle)
    );
}
