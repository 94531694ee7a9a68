use std::cell::RefCell;
use std::rc::Rc;

use geom::Distance;

use journey::{
    Activity, AnimationClock, Journey, JourneyPlayer, PlaybackStatus, ProgressUpdate, RoutePoint,
    Segment, SegmentKind, TimingConfig, TimingTable, Track, TravelMode,
};

const EPSILON: f64 = 1e-9;

fn track(name: &str, coordinates: std::ops::Range<usize>, km: f64, duration: Option<f64>) -> Segment {
    Segment {
        name: name.to_string(),
        kind: SegmentKind::Track(Activity::Hiking),
        coordinates,
        duration,
        distance: Distance::meters(km * 1000.0),
        elevation_gain: Distance::ZERO,
    }
}

#[test]
fn two_equal_tracks() {
    let config = TimingConfig::default();
    let segments = vec![track("A", 0..100, 5.0, None), track("B", 100..200, 5.0, None)];
    let table = TimingTable::build(&segments, &config);
    assert_eq!(table.entries[0].progress_start, 0.0);
    assert_eq!(table.entries[0].progress_end, 0.5);
    assert_eq!(table.entries[1].progress_start, 0.5);
    assert_eq!(table.entries[1].progress_end, 1.0);
    assert_eq!(table.entries[0].duration, table.entries[1].duration);

    let segments = vec![
        track("A", 0..100, 5.0, Some(30.0)),
        track("B", 100..200, 5.0, Some(30.0)),
    ];
    let table = TimingTable::build(&segments, &config);
    assert_eq!(table.total_duration, 60.0);
    assert!((table.progress_to_time(0.25) - 15.0).abs() < EPSILON);
    assert!((table.time_to_progress(45.0) - 0.75).abs() < EPSILON);
}

#[test]
fn retiming_preserves_position() {
    let config = TimingConfig::default();
    let mut segments = vec![
        track("A", 0..40, 1.0, Some(20.0)),
        track("B", 40..80, 1.0, Some(20.0)),
        track("C", 80..100, 1.0, Some(20.0)),
    ];
    let mut clock = AnimationClock::new(TimingTable::build(&segments, &config));
    clock.seek_to_progress(0.6);
    clock.play();
    assert!((clock.elapsed_time() - 30.0).abs() < EPSILON);

    let updates = Rc::new(RefCell::new(Vec::new()));
    let recorder = updates.clone();
    clock.subscribe(Box::new(move |update: &ProgressUpdate| {
        recorder.borrow_mut().push(update.clone());
    }));

    segments[1].duration = Some(40.0);
    clock.rebuild_timing_table(TimingTable::build(&segments, &config));

    assert!((clock.spatial_progress() - 0.6).abs() < EPSILON);
    assert!((clock.elapsed_time() - 40.0).abs() < EPSILON);
    assert_eq!(clock.total_duration(), 80.0);
    assert!(clock.is_playing());
    assert!(clock.validate_sync().in_sync);

    let updates = updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].total_duration, 80.0);
}

#[test]
fn zero_distance_transport_still_takes_time() {
    let config = TimingConfig::default();
    let transport = Segment {
        name: "ferry".to_string(),
        kind: SegmentKind::Transport(TravelMode::Boat),
        coordinates: 10..10,
        duration: None,
        distance: Distance::ZERO,
        elevation_gain: Distance::ZERO,
    };
    assert_eq!(config.resolve_duration(&transport), 10.0);

    let segments = vec![
        track("A", 0..10, 0.0, None),
        transport,
        track("B", 10..20, 0.0, None),
    ];
    let table = TimingTable::build(&segments, &config);
    assert_eq!(table.entries[1].duration, 10.0);
    assert_eq!(table.entries[1].progress_width(), 0.0);
    // The marker waits at the join for the length of the transport
    assert_eq!(table.time_to_progress(12.0), 0.5);
    assert_eq!(table.time_to_progress(18.0), 0.5);
}

#[test]
fn playback_runs_to_the_end_and_stops() {
    let segments = vec![track("A", 0..50, 2.0, Some(7.0)), track("B", 50..100, 2.0, Some(3.0))];
    let mut clock = AnimationClock::new(TimingTable::build(&segments, &TimingConfig::default()));
    clock.play();

    let mut frames = 0;
    while clock.tick(1.0 / 60.0) {
        frames += 1;
        assert!(frames < 10_000, "playback never ended");
    }
    assert_eq!(clock.elapsed_time(), clock.total_duration());
    assert_eq!(clock.spatial_progress(), 1.0);
    assert!(!clock.is_playing());
    assert_eq!(clock.status(), PlaybackStatus::Paused);
    assert_eq!(clock.current_segment(), Some(1));

    // Playing again doesn't rewind
    clock.play();
    assert!(!clock.tick(1.0));
    assert_eq!(clock.elapsed_time(), 10.0);
}

#[test]
fn seeking_clamps() {
    let segments = vec![track("A", 0..50, 2.0, Some(7.0)), track("B", 50..100, 2.0, Some(3.0))];
    let table = TimingTable::build(&segments, &TimingConfig::default());

    let mut low = AnimationClock::new(table.clone());
    let mut zero = AnimationClock::new(table.clone());
    low.seek_to_progress(-0.3);
    zero.seek_to_progress(0.0);
    assert_eq!(low.state(), zero.state());

    let mut high = AnimationClock::new(table.clone());
    let mut one = AnimationClock::new(table);
    high.seek_to_progress(1.7);
    one.seek_to_progress(1.0);
    assert_eq!(high.state(), one.state());
    assert_eq!(high.elapsed_time(), 10.0);
}

#[test]
fn mapping_is_monotonic_and_round_trips() {
    let segments = vec![
        track("A", 0..37, 3.0, None),
        track("B", 37..37, 0.0, None),
        track("C", 37..120, 11.0, Some(25.0)),
        track("D", 120..121, 0.1, None),
    ];
    let table = TimingTable::build(&segments, &TimingConfig::default());

    let mut last_time = 0.0;
    let mut last_progress = 0.0;
    for i in 0..=1000 {
        let p = i as f64 / 1000.0;
        let t = table.progress_to_time(p);
        assert!(t >= last_time);
        last_time = t;

        let t = table.total_duration * p;
        let progress = table.time_to_progress(t);
        assert!(progress >= last_progress);
        last_progress = progress;

        // Away from the zero-length segment, progress -> time -> progress is lossless
        if (p - 37.0 / 121.0).abs() > 1e-6 {
            let back = table.time_to_progress(table.progress_to_time(p));
            assert!((back - p).abs() < 1e-6, "{p} came back as {back}");
        }
    }
}

#[test]
fn build_is_idempotent() {
    let config = TimingConfig::default();
    let segments = vec![track("A", 0..10, 3.3, None), track("B", 10..25, 7.7, None)];
    assert_eq!(
        TimingTable::build(&segments, &config),
        TimingTable::build(&segments, &config)
    );
}

#[test]
fn editing_a_journey_while_playing() {
    let mut journey = Journey::new();
    for (name, lat) in [("coast", 0.0), ("hills", 0.05)] {
        let points = (0..20)
            .map(|i| RoutePoint::new(0.0005 * i as f64, lat, Some(i as f64 * 5.0)))
            .collect();
        journey.add_track(Track::new(name.to_string(), Activity::Walking, points));
    }
    let mut player = JourneyPlayer::new(journey, TimingConfig::default());
    assert_eq!(player.segments().len(), 2);

    player.insert_transport(0, TravelMode::Car).unwrap();
    assert_eq!(player.segments().len(), 3);
    assert_eq!(player.clock().table().len(), 3);

    player.clock_mut().play();
    for _ in 0..120 {
        player.clock_mut().tick(0.1);
    }
    let progress = player.clock().spatial_progress();
    assert!(progress > 0.0);

    player.set_segment_duration(0, Some(60.0)).unwrap();
    assert_eq!(player.clock().spatial_progress(), progress);
    assert!(player.clock().validate_sync().in_sync);
    assert!(player.clock().is_playing());

    player.move_track(1, 0).unwrap();
    assert_eq!(player.segments().len(), 2);
    assert_eq!(player.journey().tracks()[0].name, "hills");
}
