use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;

use kestrel::{invoke_protected, read_status, ScriptWorker};
use kestrel_script::{InterpreterState, ScriptError, Status, Variant};

fn noop_handler() -> Variant {
    Variant::callable(|_| Ok(0))
}

fn returns_normally() -> Variant {
    Variant::callable(|state| {
        // Push a result to prove it gets discarded by the shim.
        state.push(Variant::Int(1234))?;
        Ok(1)
    })
}

fn raises(msg: &str) -> Variant {
    let msg = msg.to_string();
    Variant::callable(move |_| {
        Err(ScriptError::Raised(Variant::Str(msg.clone())).into())
    })
}

#[test]
fn success_path_leaves_single_zero() {
    let mut state = InterpreterState::new();
    state.push(noop_handler()).unwrap();
    state.push(returns_normally()).unwrap();
    state.push(Variant::Int(1)).unwrap();
    state.push(Variant::Int(2)).unwrap();

    invoke_protected(&mut state);

    assert_eq!(state.top(), 1);
    assert_eq!(state.slot(0), Some(&Variant::Int(0)));
    assert_eq!(read_status(&state), Some(Status::Ok));
}

#[test]
fn callable_receives_exactly_depth_minus_two_arguments() {
    let seen = Arc::new(AtomicUsize::new(usize::MAX));

    for n in 0..5 {
        let seen2 = seen.clone();
        let mut state = InterpreterState::new();
        state.push(noop_handler()).unwrap();
        state
            .push(Variant::callable(move |state| {
                seen2.store(state.frame_top(), Ordering::SeqCst);
                Ok(0)
            }))
            .unwrap();
        for i in 0..n {
            state.push(Variant::Int(i as i64)).unwrap();
        }

        invoke_protected(&mut state);

        assert_eq!(seen.load(Ordering::SeqCst), n, "argc mismatch for n={n}");
        assert_eq!(read_status(&state), Some(Status::Ok));
    }
}

#[test]
fn guest_error_leaves_single_nonzero_status() {
    let mut state = InterpreterState::new();
    state.push(noop_handler()).unwrap();
    state.push(raises("boom")).unwrap();
    state.push(Variant::Int(7)).unwrap();

    invoke_protected(&mut state);

    assert_eq!(state.top(), 1);
    let code = state.slot(0).and_then(Variant::as_int).unwrap();
    assert_ne!(code, 0);
    assert_eq!(read_status(&state), Some(Status::RuntimeError));
}

#[test]
fn handler_runs_iff_callee_raises() {
    let invoked = Arc::new(AtomicBool::new(false));

    let flag_handler = |invoked: Arc<AtomicBool>| {
        Variant::callable(move |_| {
            invoked.store(true, Ordering::SeqCst);
            Ok(0)
        })
    };

    // Success: the handler must stay untouched.
    let mut state = InterpreterState::new();
    state.push(flag_handler(invoked.clone())).unwrap();
    state.push(returns_normally()).unwrap();
    invoke_protected(&mut state);
    assert!(!invoked.load(Ordering::SeqCst));
    assert_eq!(read_status(&state), Some(Status::Ok));

    // Raise: the handler must run.
    let mut state = InterpreterState::new();
    state.push(flag_handler(invoked.clone())).unwrap();
    state.push(raises("boom")).unwrap();
    invoke_protected(&mut state);
    assert!(invoked.load(Ordering::SeqCst));
    assert_eq!(read_status(&state), Some(Status::RuntimeError));
}

#[test]
fn post_condition_depth_is_always_one() {
    for n in 0..6 {
        for fail in [false, true] {
            let mut state = InterpreterState::new();
            state.push(noop_handler()).unwrap();
            state
                .push(if fail { raises("x") } else { returns_normally() })
                .unwrap();
            for i in 0..n {
                state.push(Variant::Int(i as i64)).unwrap();
            }

            invoke_protected(&mut state);

            assert_eq!(state.top(), 1, "depth != 1 for n={n}, fail={fail}");
        }
    }
}

#[test]
fn workers_on_separate_states_do_not_interfere() {
    let mut ok_state = InterpreterState::new();
    ok_state.push(noop_handler()).unwrap();
    ok_state.push(returns_normally()).unwrap();

    let mut err_state = InterpreterState::new();
    err_state.push(noop_handler()).unwrap();
    err_state.push(raises("isolated failure")).unwrap();

    let ok_worker = ScriptWorker::spawn(ok_state).unwrap();
    let err_worker = ScriptWorker::spawn(err_state).unwrap();

    let (ok_state, ok_status) = ok_worker.join().unwrap();
    let (err_state, err_status) = err_worker.join().unwrap();

    assert_eq!(ok_status, Status::Ok);
    assert_eq!(err_status, Status::RuntimeError);
    assert_eq!(ok_state.slot(0), Some(&Variant::Int(0)));
    assert_eq!(err_state.slot(0), Some(&Variant::Int(2)));
}

#[test]
fn detach_lets_the_call_finish_unobserved() {
    let finished = Arc::new(AtomicBool::new(false));
    let finished2 = finished.clone();

    let mut state = InterpreterState::new();
    state.push(noop_handler()).unwrap();
    state
        .push(Variant::callable(move |_| {
            finished2.store(true, Ordering::SeqCst);
            Ok(0)
        }))
        .unwrap();

    let worker = ScriptWorker::spawn(state).unwrap();
    worker.detach();

    // The call still runs to completion on the detached thread.
    for _ in 0..200 {
        if finished.load(Ordering::SeqCst) {
            return;
        }
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    panic!("detached invocation never ran");
}

#[test]
fn handler_failure_is_reported_as_handler_error() {
    let mut state = InterpreterState::new();
    state.push(raises("handler blew up")).unwrap(); // handler slot raises itself
    state.push(raises("original error")).unwrap();

    invoke_protected(&mut state);

    assert_eq!(state.top(), 1);
    assert_eq!(read_status(&state), Some(Status::HandlerError));
}
