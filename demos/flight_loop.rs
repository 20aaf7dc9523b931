use embedded_time::{rate::Fraction, Clock, Instant};
use flight_scheduler::{Error, Event, Priority, Scheduler, Task, TaskId, TaskRegistry};
use nalgebra::Vector3;
use pid_controller::{error, P};
use std::time;

/// Microseconds since the clock was created.
struct HostClock {
    start: time::Instant,
}

impl Clock for HostClock {
    type T = u32;

    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000_000);

    fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
        Ok(Instant::new(self.start.elapsed().as_micros() as u32))
    }
}

#[derive(Default)]
struct Copter {
    gyro: Vector3<f32>,
    filtered_gyro: Vector3<f32>,
    gyro_samples: u32,
    filter_pending: bool,
    pid_pending: bool,
    rate_cmd: Vector3<f32>,
    rate_p: P<f32>,
    rate_output: Vector3<f32>,
    rx_frames: u32,
}

fn gyro_sample(event: Event<'_, Copter>) {
    let copter = event.state;
    let t = event.now.0 as f32 * 1e-6;
    copter.gyro = Vector3::new(t.sin(), t.cos(), 0.1);
    copter.gyro_samples += 1;

    // Filter at half the gyro rate, PID after every filter run
    copter.filter_pending = copter.gyro_samples % 2 == 0;
}

fn filter(event: Event<'_, Copter>) {
    let copter = event.state;
    copter.filtered_gyro = copter.filtered_gyro * 0.8 + copter.gyro * 0.2;
    copter.filter_pending = false;
    copter.pid_pending = true;
}

fn pid_loop(event: Event<'_, Copter>) {
    let copter = event.state;
    let p = copter.rate_p;
    copter.rate_output = copter
        .rate_cmd
        .zip_map(&copter.filtered_gyro, |cmd, rate| {
            p.control_with_error(error(cmd, rate))
        });
    copter.pid_pending = false;
}

fn update_accel(_event: Event<'_, Copter>) {}

fn rx_ready(_copter: &mut Copter, _now: u32, since_last_run: u32) -> bool {
    since_last_run >= 20_000
}

fn update_rx(event: Event<'_, Copter>) {
    let copter = event.state;
    copter.rx_frames += 1;
    copter.rate_cmd = Vector3::new(0.5, 0., 0.);
}

fn main() -> Result<(), Error> {
    let tasks = TaskRegistry::from_tasks([
        Task::new(TaskId::Gyro, "GYRO", gyro_sample)
            .with_hz(4000)
            .with_priority(Priority::Realtime),
        Task::new(TaskId::Filter, "FILTER", filter)
            .with_hz(2000)
            .with_priority(Priority::Realtime),
        Task::new(TaskId::Pid, "PID", pid_loop)
            .with_hz(2000)
            .with_priority(Priority::Realtime),
        Task::new(TaskId::Accel, "ACCEL", update_accel)
            .with_hz(1000)
            .with_priority(Priority::Medium),
        Task::new(TaskId::Rx, "RX", update_rx)
            .with_check(rx_ready)
            .with_hz(50)
            .with_priority(Priority::High),
    ]);

    let clock = HostClock {
        start: time::Instant::now(),
    };
    let mut scheduler = Scheduler::new(clock, tasks)
        .with_gyro_chain(|copter| copter.filter_pending, |copter| copter.pid_pending);

    scheduler.init();
    for id in [
        TaskId::Gyro,
        TaskId::Filter,
        TaskId::Pid,
        TaskId::Accel,
        TaskId::Rx,
    ] {
        scheduler.set_task_enabled(id, true);
    }
    scheduler.enable_gyro();

    let mut copter = Copter::default();
    let start = time::Instant::now();
    while start.elapsed() < time::Duration::from_secs(1) {
        scheduler.run_once(&mut copter)?;
    }

    for id in TaskId::ALL {
        let info = scheduler.get_task_info(id);
        if info.is_enabled {
            println!(
                "{:<10} period {:>6}us  max {:>4}us  avg {:>4}us  total {:>8}us",
                info.name,
                info.desired_period,
                info.max_execution_time,
                info.average_execution_time,
                info.total_execution_time
            );
        }
    }
    println!(
        "gyro samples: {}, rx frames: {}, load: {}%",
        copter.gyro_samples,
        copter.rx_frames,
        scheduler.average_system_load_percent()
    );
    println!("rate output: {:?}", copter.rate_output);

    Ok(())
}
