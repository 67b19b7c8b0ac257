use std::{f32::consts::TAU, fs, path::PathBuf};

use anyhow::Context;
use maths::Vec3;
use tracer::{
    BvhConfig, Ray, Scene, Transform,
    mesh::shapes,
    raytracer::triangle_bytes,
};

const HELP: &str = "\
Builds a BVH over a procedural scene, then animates the instances and refits.

USAGE:
  tracer [OPTIONS]

OPTIONS:
  --instances N   number of mesh instances [default: 8]
  --frames N      edit + refit iterations [default: 4]
  --leaf-size N   maximum primitives per leaf [default: 4]
  --buckets N     SAH buckets per axis [default: 12]
  --dump DIR      write nodes.bin, primitives.bin and triangles.bin to DIR
  -h, --help      print this help
";

struct Args {
    instances: usize,
    frames: usize,
    leaf_size: Option<usize>,
    buckets: Option<usize>,
    dump: Option<PathBuf>,
}

fn parse_args() -> Result<Option<Args>, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(None);
    }

    let args = Args {
        instances: pargs.opt_value_from_str("--instances")?.unwrap_or(8),
        frames: pargs.opt_value_from_str("--frames")?.unwrap_or(4),
        leaf_size: pargs.opt_value_from_str("--leaf-size")?,
        buckets: pargs.opt_value_from_str("--buckets")?,
        dump: pargs.opt_value_from_str("--dump")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        log::warn!("Ignoring unused arguments: {remaining:?}");
    }

    Ok(Some(args))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let mut config = BvhConfig::default();
    if let Some(leaf_size) = args.leaf_size {
        config = config.with_max_leaf_size(leaf_size);
    }
    if let Some(buckets) = args.buckets {
        config = config.with_bucket_count(buckets);
    }

    let mut scene = Scene::with_config(config)?;
    let meshes = [shapes::cube(), shapes::quad(), shapes::triangle()];
    let mut instances = Vec::with_capacity(args.instances);
    for i in 0..args.instances {
        let angle = i as f32 / args.instances.max(1) as f32 * TAU;
        let transform = Transform::new(Vec3::new(angle.cos() * 6.0, 0.0, angle.sin() * 6.0));
        instances.push(scene.add_mesh(&meshes[i % meshes.len()], transform, i as i32)?);
    }

    scene.update()?;
    let stats = scene.bvh().stats();
    log::info!(
        "BVH: {} nodes, {} leaves, depth {}, largest leaf {}, average leaf {:.2}",
        stats.node_count,
        stats.leaf_count,
        stats.max_depth,
        stats.max_leaf_size,
        stats.average_leaf_size
    );
    if let Some(bounds) = stats.root_bounds {
        log::info!("Root bounds: {:?} to {:?}", bounds.min, bounds.max);
    }

    for frame in 1..=args.frames {
        let spin = frame as f32 * 0.25;
        for (i, &id) in instances.iter().enumerate() {
            let Some(instance) = scene.instance(id) else {
                continue;
            };
            let transform = instance
                .transform()
                .with_rotation(Vec3::new(0.0, spin, 0.0))
                .with_uniform_scale(1.0 + 0.1 * ((frame + i) % 3) as f32);
            scene.set_transform(id, transform)?;
        }

        let update = scene.update()?;
        scene
            .bvh()
            .validate(Some(scene.triangles()))
            .with_context(|| format!("BVH invalid after frame {frame}"))?;

        let ray = Ray::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.6, -1.0, 0.0));
        let hit = scene.bvh().intersect(scene.triangles(), &ray);
        log::info!(
            "Frame {frame}: refitted={} range={:?} probe hit={:?}",
            update.refitted,
            update.triangle_range,
            hit.map(|hit| (hit.triangle_index, hit.t))
        );
    }

    if let Some(dir) = args.dump {
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        for (name, bytes) in [
            ("nodes.bin", scene.bvh().node_bytes()),
            ("primitives.bin", scene.bvh().primitive_bytes()),
            ("triangles.bin", triangle_bytes(scene.triangles())),
        ] {
            let path = dir.join(name);
            fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        }
        log::info!("Wrote buffers to {}", dir.display());
    }

    Ok(())
}
