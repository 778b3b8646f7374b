use super::*;
use tokio::time::sleep;

#[test]
fn formats_seconds_and_centiseconds() {
    assert_eq!(format_elapsed(0), "0.00");
    assert_eq!(format_elapsed(70), "0.07");
    assert_eq!(format_elapsed(999), "0.99");
    assert_eq!(format_elapsed(3450), "3.45");
    assert_eq!(format_elapsed(61_005), "61.00");
}

#[tokio::test(start_paused = true)]
async fn advances_by_quantum_while_running() {
    let timer = ElapsedTimer::new(Duration::from_millis(10));
    assert_eq!(timer.current(), 0);
    assert!(!timer.is_running());

    timer.start();
    assert!(timer.is_running());
    assert_eq!(timer.current(), 0);

    sleep(Duration::from_millis(35)).await;
    assert_eq!(timer.current(), 30);
}

#[tokio::test(start_paused = true)]
async fn stop_freezes_the_counter() {
    let timer = ElapsedTimer::new(Duration::from_millis(10));
    timer.start();
    sleep(Duration::from_millis(55)).await;
    timer.stop();
    let frozen = timer.current();
    assert_eq!(frozen, 50);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(timer.current(), frozen);
    assert!(!timer.is_running());

    timer.stop();
    assert_eq!(timer.current(), frozen);
}

#[tokio::test(start_paused = true)]
async fn restart_resets_to_zero() {
    let timer = ElapsedTimer::new(Duration::from_millis(10));
    timer.start();
    sleep(Duration::from_millis(25)).await;
    assert_eq!(timer.current(), 20);

    timer.start();
    assert_eq!(timer.current(), 0);
    sleep(Duration::from_millis(15)).await;
    assert_eq!(timer.current(), 10);
}

#[tokio::test(start_paused = true)]
async fn samples_are_monotonic_while_running() {
    let timer = ElapsedTimer::new(Duration::from_millis(10));
    timer.start();

    let mut previous = timer.current();
    for _ in 0..50 {
        sleep(Duration::from_millis(7)).await;
        let sample = timer.current();
        assert!(sample >= previous, "{sample} < {previous}");
        previous = sample;
    }
}

#[tokio::test]
async fn ticks_from_a_cancelled_run_are_discarded() {
    let timer = ElapsedTimer::new(Duration::from_millis(10));
    timer.start();
    let stale_generation = timer.shared.lock().generation;
    timer.stop();

    assert!(!timer.shared.advance(stale_generation, 10));
    assert_eq!(timer.current(), 0);

    timer.start();
    assert!(!timer.shared.advance(stale_generation, 10));
    assert_eq!(timer.current(), 0);
    timer.stop();
}

#[tokio::test(start_paused = true)]
async fn subscribers_follow_the_counter() {
    let timer = ElapsedTimer::new(Duration::from_millis(10));
    let mut elapsed = timer.subscribe();

    timer.start();
    elapsed.changed().await.expect("sender alive");
    sleep(Duration::from_millis(20)).await;
    timer.stop();

    assert_eq!(*elapsed.borrow_and_update(), timer.current());
}
