use luster::options::Options;
use luster::splat::SplatModel;
use luster::Viewer;
use rand::Rng;

/// Splats per demo blob.
const SPLATS_PER_BLOB: usize = 4000;

/// Blob centers and base colors for the procedural demo cloud.
const BLOBS: [([f32; 3], [f32; 3]); 3] = [
    ([-1.5, 0.0, 0.0], [0.9, 0.3, 0.2]),
    ([1.5, 0.0, 0.0], [0.2, 0.8, 0.3]),
    ([0.0, 1.8, 0.0], [0.3, 0.4, 0.9]),
];

/// Roughly normal sample in [-1.5, 1.5] (sum of three uniforms).
fn gaussian_offset(rng: &mut impl Rng) -> f32 {
    let sum: f32 = (0..3).map(|_| rng.random_range(0.0..1.0)).sum();
    sum - 1.5
}

/// Synthesize a cloud of Gaussian blobs so the async sort path can be
/// exercised without a model file.
fn procedural_cloud() -> Result<SplatModel, luster::LusterError> {
    let mut rng = rand::rng();
    let n = BLOBS.len() * SPLATS_PER_BLOB;

    let mut positions = Vec::with_capacity(n * 3);
    let mut rotations = Vec::with_capacity(n * 4);
    let mut scales = Vec::with_capacity(n * 3);
    let mut colors = Vec::with_capacity(n * 4);

    for (center, color) in BLOBS {
        for _ in 0..SPLATS_PER_BLOB {
            positions.push(center[0] + 0.6 * gaussian_offset(&mut rng));
            positions.push(center[1] + 0.6 * gaussian_offset(&mut rng));
            positions.push(center[2] + 0.6 * gaussian_offset(&mut rng));

            // Random unit quaternion.
            let q = [
                gaussian_offset(&mut rng),
                gaussian_offset(&mut rng),
                gaussian_offset(&mut rng),
                gaussian_offset(&mut rng) + 0.5,
            ];
            let norm =
                (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3])
                    .sqrt()
                    .max(1e-6);
            rotations.extend(q.iter().map(|c| c / norm));

            // Log-space extents around a few centimeters.
            let base: f32 = rng.random_range(0.02..0.08);
            scales.push(base.ln());
            scales.push((base * rng.random_range(0.5..2.0)).ln());
            scales.push((base * rng.random_range(0.5..2.0)).ln());

            let tint = rng.random_range(0.7..1.0);
            colors.push(color[0] * tint);
            colors.push(color[1] * tint);
            colors.push(color[2] * tint);
            colors.push(rng.random_range(0.4..0.9));
        }
    }

    SplatModel::new(positions, rotations, scales, colors).map_err(Into::into)
}

fn main() {
    env_logger::init();

    let options = match std::env::args().nth(1) {
        Some(path) => match Options::load(std::path::Path::new(&path)) {
            Ok(options) => options,
            Err(e) => {
                log::error!("failed to load options from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Options::default(),
    };

    let model = match procedural_cloud() {
        Ok(model) => model,
        Err(e) => {
            log::error!("failed to build demo cloud: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Viewer::builder()
        .with_model(model)
        .with_options(options)
        .build()
        .run()
    {
        log::error!("{e}");
        std::process::exit(1);
    }
}
