use plotters::backend::DrawingBackend;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::DrawingArea;

use crate::errors::DrawingError;

/// Allows contours and other elements of a segmentation to draw themselves onto a plotting root.
pub trait PlotSelf {
    /// Define which elements to draw when plotting the element itself.
    fn plot_self<Db>(
        &self,
        root: &mut DrawingArea<Db, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    ) -> Result<(), DrawingError>
    where
        Db: DrawingBackend;
}
