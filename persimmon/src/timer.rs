use std::time::Duration;

use tokio::{
    sync::mpsc,
    time::{self, Instant},
};

/// Handle to a periodic timer running as a background task
///
/// The timer invokes `on_tick` every interval until [`Timer::stop`] is
/// called or the handle is dropped. The stop callback runs exactly once
/// when the task exits, no matter how many times a stop is requested.
///
/// [`Timer::reset`] and [`Timer::stop`] on an already stopped timer are
/// no-ops.
#[derive(Debug)]
pub(crate) struct Timer {
    commands: mpsc::UnboundedSender<TimerCommand>,
}

#[derive(Debug)]
enum TimerCommand {
    Reset(Duration),
    Stop,
}

impl Timer {
    pub(crate) fn spawn<T, S>(interval: Duration, mut on_tick: T, on_stop: S) -> Self
    where
        T: FnMut() + Send + 'static,
        S: FnOnce() + Send + 'static,
    {
        let (commands, mut receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut interval = interval;
            let sleep = time::sleep(interval);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    () = sleep.as_mut() => {
                        on_tick();
                        sleep.as_mut().reset(Instant::now() + interval);
                    }
                    cmd = receiver.recv() => match cmd {
                        Some(TimerCommand::Reset(new_interval)) => {
                            interval = new_interval;
                            sleep.as_mut().reset(Instant::now() + new_interval);
                        }
                        Some(TimerCommand::Stop) | None => break,
                    },
                }
            }

            on_stop();
        });

        Self { commands }
    }

    /// Restart the timer with a new interval, delaying the next tick
    pub(crate) fn reset(&self, interval: Duration) {
        let _ = self.commands.send(TimerCommand::Reset(interval));
    }

    /// Ask the timer task to exit and run the stop callback
    pub(crate) fn stop(&self) {
        let _ = self.commands.send(TimerCommand::Stop);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };
    use std::time::Duration;

    use tokio::time;

    use super::Timer;

    #[tokio::test]
    async fn ticks_periodically() {
        let ticks = Arc::new(AtomicU32::new(0));
        let ticks2 = Arc::clone(&ticks);

        let _timer = Timer::spawn(
            Duration::from_millis(10),
            move || {
                ticks2.fetch_add(1, Ordering::AcqRel);
            },
            || {},
        );

        time::sleep(Duration::from_millis(200)).await;
        assert!(ticks.load(Ordering::Acquire) >= 2);
    }

    #[tokio::test]
    async fn stop_callback_runs_once() {
        let stops = Arc::new(AtomicU32::new(0));
        let stops2 = Arc::clone(&stops);

        let timer = Timer::spawn(Duration::from_secs(60), || {}, move || {
            stops2.fetch_add(1, Ordering::AcqRel);
        });

        timer.stop();
        timer.stop();
        drop(timer);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(1, stops.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn reset_shortens_interval() {
        let ticks = Arc::new(AtomicU32::new(0));
        let ticks2 = Arc::clone(&ticks);

        let timer = Timer::spawn(
            Duration::from_secs(60),
            move || {
                ticks2.fetch_add(1, Ordering::AcqRel);
            },
            || {},
        );

        timer.reset(Duration::from_millis(10));
        time::sleep(Duration::from_millis(200)).await;
        assert!(ticks.load(Ordering::Acquire) >= 1);
    }

    #[tokio::test]
    async fn reset_after_stop_is_noop() {
        let ticks = Arc::new(AtomicU32::new(0));
        let ticks2 = Arc::clone(&ticks);

        let timer = Timer::spawn(
            Duration::from_secs(60),
            move || {
                ticks2.fetch_add(1, Ordering::AcqRel);
            },
            || {},
        );

        timer.stop();
        time::sleep(Duration::from_millis(50)).await;
        timer.reset(Duration::from_millis(1));
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(0, ticks.load(Ordering::Acquire));
    }
}
