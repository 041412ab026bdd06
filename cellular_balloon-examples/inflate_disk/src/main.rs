use cellular_balloon::prelude::*;

use plotters::prelude::*;
use tracing_subscriber::{filter, prelude::*};

const IMAGE_SIZE: usize = 120;
const CELL_CENTER: [f64; 2] = [58.0, 63.0];
const CELL_RADIUS: f64 = 24.0;
const INFLATION_STEPS: usize = 600;
const OPTIMIZATION_STEPS: usize = 200;
const REFINE_EVERY: usize = 40;

/// Dark disk on a bright background with a softened rim.
fn synthetic_cell() -> ndarray::Array2<f64> {
    ndarray::Array2::from_shape_fn((IMAGE_SIZE, IMAGE_SIZE), |(y, x)| {
        let dx = x as f64 - CELL_CENTER[0];
        let dy = y as f64 - CELL_CENTER[1];
        let r = dx.hypot(dy);
        let rim = ((r - CELL_RADIUS) / 1.5).clamp(-1.0, 1.0);
        120.0 + 100.0 * rim
    })
}

fn render(field: &ImageField, contour: &Contour, filename: &str) -> Result<(), DrawingError> {
    let size = (4 * IMAGE_SIZE) as u32;
    let root = BitMapBackend::new(filename, (size, size)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .build_cartesian_2d(0.0..IMAGE_SIZE as f64, IMAGE_SIZE as f64..0.0)?;
    for ((y, x), &value) in field.intensity().indexed_iter() {
        let grey = value.clamp(0.0, 255.0) as u8;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x as f64, y as f64), (x as f64 + 1.0, y as f64 + 1.0)],
            RGBColor(grey, grey, grey).filled(),
        )))?;
    }
    let mut area = chart.plotting_area().clone();
    contour.plot_self(&mut area)?;
    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_line_number(true)
        .with_level(true);
    tracing_subscriber::registry()
        .with(stdout_log.with_filter(filter::LevelFilter::INFO))
        .init();

    let parameters = BalloonParameters {
        target_level: 100.0,
        initial_radius: 5.0,
        ..Default::default()
    };
    let field = ImageField::new(synthetic_cell())?;
    let mut contour = Contour::from_parameters(
        nalgebra::Vector2::new(CELL_CENTER[0] + 3.0, CELL_CENTER[1] - 2.0),
        &parameters,
    )?;
    let mut observed_max_vertices = contour.len();

    for step in 0..INFLATION_STEPS {
        contour.advance_inflate(&field, &parameters);
        if (step + 1) % REFINE_EVERY == 0 {
            contour.refine(parameters.max_segment_length, &mut observed_max_vertices);
            tracing::info!(
                step,
                vertices = contour.len(),
                radius = contour.radius_estimate(),
                "inflating"
            );
        }
    }

    contour.reset_for_optimization();
    for _ in 0..OPTIMIZATION_STEPS {
        contour.advance_optimize(&field, &parameters);
    }
    contour.check_consistency()?;

    let geometry = contour.compute_mass_geometry().clone();
    tracing::info!(
        area = geometry.area,
        centroid_x = geometry.centroid.x,
        centroid_y = geometry.centroid.y,
        lx = geometry.lx,
        ly = geometry.ly,
        observed_max_vertices,
        "segmented cell"
    );

    render(&field, &contour, "inflate_disk.png")?;
    Ok(())
}
