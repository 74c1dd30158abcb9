// Drives a controller over a simulated bottleneck link and reports how it does.
//
// The link is a drop-tail queue served at a fixed rate, followed by a fixed
// propagation delay. Time is simulated in 1ms steps, the controller reads the
// simulated clock.

use std::{
    collections::{BTreeSet, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use dgram_cc::{CongestionController, ControllerKind, ControllerOpts, Environment, SeqNr};
use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Fixed,
    Aimd,
    DelayTriggered,
}

impl From<Kind> for ControllerKind {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Fixed => ControllerKind::Fixed,
            Kind::Aimd => ControllerKind::Aimd,
            Kind::DelayTriggered => ControllerKind::DelayTriggered,
        }
    }
}

#[derive(Debug, Clone, Parser)]
struct Args {
    #[arg(long, default_value = "delay-triggered")]
    kind: Kind,

    /// Bottleneck service rate, datagrams per millisecond.
    #[arg(long, default_value_t = 1.0)]
    rate: f64,

    /// Round-trip propagation delay, milliseconds.
    #[arg(long, default_value_t = 40)]
    rtt_ms: u64,

    /// Bottleneck queue size, datagrams.
    #[arg(long, default_value_t = 200)]
    queue: usize,

    #[arg(long, default_value_t = 20)]
    seconds: u64,

    /// Window for the fixed controller, initial window for the others.
    #[arg(long)]
    base_window: Option<u32>,

    /// Log controller state changes.
    #[arg(long)]
    tracing: bool,
}

#[derive(Clone)]
struct SimClock {
    now: Arc<Mutex<Instant>>,
}

impl SimClock {
    fn advance(&self, dur: Duration) {
        *self.now.lock() += dur;
    }
}

impl Environment for SimClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

struct InQueue {
    seq: SeqNr,
    sent_at: u64,
}

struct PendingAck {
    arrives_at: u64,
    seq: SeqNr,
    sent_at: u64,
    received_at: u64,
}

#[derive(Default)]
struct Stats {
    acked: u64,
    dropped: u64,
    delay_sum: u64,
}

struct Sender {
    queue: VecDeque<InQueue>,
    queue_limit: usize,
    // Sent and not yet known to be acked or lost.
    outstanding: BTreeSet<SeqNr>,
    next_seq: SeqNr,
    last_ack_at: u64,
    stats: Stats,
}

impl Sender {
    fn send(&mut self, cc: &mut dyn CongestionController, now: u64, after_timeout: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        cc.datagram_was_sent(seq, now, after_timeout);
        self.outstanding.insert(seq);
        if self.queue.len() < self.queue_limit {
            self.queue.push_back(InQueue { seq, sent_at: now });
        } else {
            self.stats.dropped += 1;
        }
    }

    fn on_ack(&mut self, cc: &mut dyn CongestionController, ack: PendingAck, now: u64) {
        cc.ack_received(ack.seq, ack.sent_at, ack.received_at, now);
        // The link is FIFO, so anything older that's still outstanding was dropped.
        self.outstanding = self.outstanding.split_off(&(ack.seq + 1));
        self.last_ack_at = now;
        self.stats.acked += 1;
        self.stats.delay_sum += now - ack.sent_at;
    }

    fn on_timeout(&mut self, cc: &mut dyn CongestionController, now: u64) {
        self.outstanding.clear();
        self.send(cc, now, true);
        self.last_ack_at = now;
    }

    fn in_flight(&self) -> u32 {
        self.outstanding.len() as u32
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let clock = SimClock {
        now: Arc::new(Mutex::new(Instant::now())),
    };
    let mut cc = ControllerOpts {
        kind: args.kind.into(),
        tracing: args.tracing,
        base_window: args.base_window,
        ..Default::default()
    }
    .create(clock.clone())
    .context("error creating controller")?;

    let mut sender = Sender {
        queue: VecDeque::with_capacity(args.queue),
        queue_limit: args.queue,
        outstanding: BTreeSet::new(),
        next_seq: SeqNr(0),
        last_ack_at: 0,
        stats: Stats::default(),
    };
    let mut acks: VecDeque<PendingAck> = VecDeque::new();
    let mut service_credit = 0.;
    let mut total = Stats::default();

    for now in 0..args.seconds * 1000 {
        while acks.front().is_some_and(|a| a.arrives_at <= now) {
            let Some(ack) = acks.pop_front() else { break };
            sender.on_ack(cc.as_mut(), ack, now);
        }

        if now.saturating_sub(sender.last_ack_at) > cc.timeout_ms() {
            sender.on_timeout(cc.as_mut(), now);
        }
        while sender.in_flight() < cc.window_size() {
            sender.send(cc.as_mut(), now, false);
        }

        service_credit += args.rate;
        while service_credit >= 1. {
            let Some(d) = sender.queue.pop_front() else {
                service_credit = 0.;
                break;
            };
            service_credit -= 1.;
            acks.push_back(PendingAck {
                arrives_at: now + args.rtt_ms,
                seq: d.seq,
                sent_at: d.sent_at,
                received_at: now + args.rtt_ms / 2,
            });
        }

        if (now + 1) % 1000 == 0 {
            let stats = std::mem::take(&mut sender.stats);
            let state = cc.state();
            info!(
                second = (now + 1) / 1000,
                throughput = stats.acked,
                avg_delay_ms = stats.delay_sum.checked_div(stats.acked),
                dropped = stats.dropped,
                phase = ?state.phase,
                window = state.window,
                target_delay_ms = state.target_delay_ms,
                "tick"
            );
            total.acked += stats.acked;
            total.dropped += stats.dropped;
            total.delay_sum += stats.delay_sum;
        }

        clock.advance(Duration::from_millis(1));
    }

    let capacity = (args.rate * 1000. * args.seconds as f64) as u64;
    info!(
        acked = total.acked,
        capacity,
        utilization = total.acked as f64 / capacity.max(1) as f64,
        avg_delay_ms = total.delay_sum.checked_div(total.acked),
        dropped = total.dropped,
        "done"
    );
    Ok(())
}
