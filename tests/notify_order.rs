//! Listener delivery order under concurrent and re-entrant transitions

use std::sync::mpsc;
use std::sync::{Arc, Mutex, Weak};
use std::thread;

use webcam_recorder::platform::SyntheticDevices;
use webcam_recorder::{CaptureOptions, RecordingState, WebcamController};

fn mounted() -> Arc<WebcamController> {
    let controller =
        WebcamController::new(Arc::new(SyntheticDevices::new()), CaptureOptions::default());
    tokio_test::block_on(controller.acquire()).unwrap();
    Arc::new(controller)
}

#[test]
fn test_stop_during_slow_listener_keeps_order() {
    let controller = mounted();

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (resume_tx, resume_rx) = mpsc::channel::<()>();
    let entered_tx = Mutex::new(entered_tx);
    let resume_rx = Mutex::new(resume_rx);
    controller.subscribe(move |state| {
        if state == RecordingState::Recording {
            entered_tx.lock().unwrap().send(()).unwrap();
            resume_rx.lock().unwrap().recv().unwrap();
        }
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    controller.subscribe(move |state| log.lock().unwrap().push(state));

    let starter = {
        let controller = controller.clone();
        thread::spawn(move || controller.start().unwrap())
    };
    entered_rx.recv().unwrap();

    // The first listener is still inside the Recording notification.
    controller.stop();
    assert_eq!(controller.current_state(), RecordingState::Stopped);
    assert_eq!(*controller.watch_state().borrow(), RecordingState::Stopped);

    resume_tx.send(()).unwrap();
    starter.join().unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen, vec![RecordingState::Recording, RecordingState::Stopped]);
    assert_eq!(seen.last().copied(), Some(controller.current_state()));
}

#[test]
fn test_reentrant_stop_from_listener() {
    let controller = mounted();
    let weak: Weak<WebcamController> = Arc::downgrade(&controller);
    controller.subscribe(move |state| {
        if state == RecordingState::Recording {
            if let Some(controller) = weak.upgrade() {
                controller.stop();
            }
        }
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    controller.subscribe(move |state| log.lock().unwrap().push(state));

    controller.start().unwrap();

    assert_eq!(controller.current_state(), RecordingState::Stopped);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![RecordingState::Recording, RecordingState::Stopped]
    );
}

#[test]
fn test_many_cycles_across_threads_end_consistent() {
    let controller = mounted();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    controller.subscribe(move |state| log.lock().unwrap().push(state));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let controller = controller.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    controller.start().unwrap();
                    controller.stop();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let seen = seen.lock().unwrap();
    assert_eq!(seen.last().copied(), Some(controller.current_state()));
    for pair in seen.windows(2) {
        assert_ne!(pair[0], pair[1], "each delivered state is a change");
    }
}
