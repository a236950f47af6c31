//! Non-interactive scenario runner for `sbuffer_rs`.
//!
//! Pushes a fixed sequence of spans onto a buffer and prints the resulting
//! tree (`dump`) and ASCII strip (`print`) to stdout. The windowed,
//! mouse-driven demo the original project built around the core is out of
//! scope here; this binary exists to exercise the library end to end from
//! the command line.

use clap::{Parser, ValueEnum};
use sbuffer_rs::{Buffer, PushOutcome};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// A single full-width span.
    Single,
    /// A nearer span overwrites half of a farther one.
    Overwrite,
    /// A nearer span lands in the middle of a farther one and bisects it.
    Bisect,
    /// A farther span entirely behind an existing one is rejected.
    Occluded,
    /// Seven disjoint equal-depth spans pushed left to right, stressing rotations.
    Chain,
    /// The nine-push overwrite sequence ported from the original project's own smoke test.
    NinePush,
}

#[derive(Parser, Debug)]
#[command(about = "Exercise the s-buffer insertion engine against fixed scenarios")]
struct Args {
    /// Raster width in columns.
    #[arg(long, default_value_t = 16)]
    width: i32,

    /// View-space near-plane distance.
    #[arg(long, default_value_t = 4.0)]
    z_near: f32,

    /// Maximum descent/traversal stack depth.
    #[arg(long, default_value_t = 64)]
    max_depth: usize,

    /// Which scenario to run.
    #[arg(long, value_enum, default_value_t = Scenario::NinePush)]
    scenario: Scenario,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut buf = Buffer::new(args.width, args.z_near, args.max_depth)?;

    let pushes: Vec<(f32, f32, f32, f32, u8)> = match args.scenario {
        Scenario::Single => vec![(0.0, args.width as f32, 1.0, 1.0, b'X')],
        Scenario::Overwrite => vec![
            (0.0, 4.0, 1.0, 1.0, b'A'),
            (2.0, 6.0, 2.0, 2.0, b'B'),
        ],
        Scenario::Bisect => vec![
            (0.0, 4.0, 1.0, 1.0, b'A'),
            (1.0, 3.0, 2.0, 2.0, b'B'),
        ],
        Scenario::Occluded => vec![
            (0.0, 6.0, 2.0, 2.0, b'A'),
            (1.0, 4.0, 1.0, 1.0, b'B'),
        ],
        Scenario::Chain => (0..7)
            .map(|i| (i as f32, (i + 1) as f32, 1.0, 1.0, b'A' + i as u8))
            .collect(),
        Scenario::NinePush => vec![
            (5.0, 6.0, 1.0, 1.0, b'A'),
            (1.0, 2.0, 1.0, 1.0, b'B'),
            (3.0, 4.0, 1.0, 1.0, b'C'),
            (3.0, 6.0, 1.0, 1.0, b'D'),
            (3.0, 7.0, 1.0, 1.0, b'E'),
            (0.0, 7.0, 1.0, 1.0, b'F'),
            (3.0, 4.0, 1.0, 1.0, b'G'),
            (0.0, 3.0, 1.0, 1.0, b'H'),
            (0.0, 5.0, 1.0, 1.0, b'I'),
        ],
    };

    for (x0, x1, w0, w1, id) in pushes {
        let x1 = x1.min(args.width as f32);
        if x1 <= x0 {
            continue;
        }
        match buf.push(x0, x1, w0, w1, id) {
            PushOutcome::Inserted => tracing::info!(%x0, %x1, id = %(id as char), "pushed"),
            PushOutcome::Occluded => tracing::info!(%x0, %x1, id = %(id as char), "occluded"),
            PushOutcome::DepthExhausted => {
                tracing::warn!(%x0, %x1, id = %(id as char), "depth exhausted");
            }
        }
    }

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    buf.dump(&mut lock)?;
    buf.print(&mut lock)?;

    Ok(())
}
