use cellular_balloon_concepts::{DrawingError, PlotSelf};

use plotters::{
    backend::DrawingBackend,
    coord::cartesian::Cartesian2d,
    coord::types::RangedCoordf64,
    prelude::{DrawingArea, PathElement, Polygon},
    style::ShapeStyle,
};

use crate::Contour;

impl PlotSelf for Contour {
    fn plot_self<Db>(
        &self,
        root: &mut DrawingArea<Db, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    ) -> Result<(), DrawingError>
    where
        Db: DrawingBackend,
    {
        let cell_inside_color = plotters::prelude::full_palette::PURPLE;
        let cell_border_color = plotters::prelude::WHITE;

        let points: Vec<(f64, f64)> = self.vertices().iter().map(|v| (v.x, v.y)).collect();

        // Plot the inside of the contour
        let cell_inside = Polygon::new(
            points.clone(),
            Into::<ShapeStyle>::into(&cell_inside_color).filled(),
        );
        root.draw(&cell_inside)?;

        // Plot the closed boundary on top
        let mut boundary = points;
        if let Some(first) = boundary.first().copied() {
            boundary.push(first);
        }
        let cell_border = PathElement::new(
            boundary,
            Into::<ShapeStyle>::into(&cell_border_color).stroke_width(1),
        );
        root.draw(&cell_border)?;
        Ok(())
    }
}
