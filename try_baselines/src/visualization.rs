//! PNG charts of predictions and network training curves.

use plotters::prelude::*;
use std::path::Path;

use pricecast::TimeSeries;
use pricecast::models::LossHistory;
use stats::find_min_max;

use crate::predictors::PredictionSeries;

fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let finite: Vec<f64> = values.copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (0.0, 1.0);
    }
    let (lo, hi) = find_min_max(&finite);
    let pad = ((hi - lo) * 0.05).max(1e-6);
    (lo - pad, hi + pad)
}

/// Overlay of the training history, the held-out actuals and one method's
/// predictions, plotted against observation number.
pub fn plot_prediction<P: AsRef<Path>>(
    history: &TimeSeries,
    actual: &TimeSeries,
    predicted: &PredictionSeries,
    output_path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(output_path.as_ref(), (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let offset = history.len();
    let n_total = offset + actual.len();
    let (min_y, max_y) = value_range(
        history
            .values()
            .iter()
            .chain(actual.values())
            .chain(&predicted.values),
    );

    let mut chart = ChartBuilder::on(&root)
        .caption(predicted.method.name(), ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0usize..n_total.max(1), min_y..max_y)?;

    chart
        .configure_mesh()
        .x_desc("Observation")
        .y_desc("Close")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            history.values().iter().enumerate().map(|(i, v)| (i, *v)),
            &BLUE,
        ))?
        .label("Train")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .draw_series(LineSeries::new(
            actual.values().iter().enumerate().map(|(i, v)| (offset + i, *v)),
            &GREEN,
        ))?
        .label("Actual")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &GREEN));

    chart
        .draw_series(LineSeries::new(
            predicted.values.iter().enumerate().map(|(i, v)| (offset + i, *v)),
            &RED,
        ))?
        .label("Predicted")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Training and validation loss per epoch
pub fn plot_loss_history<P: AsRef<Path>>(
    history: &LossHistory,
    output_path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(output_path.as_ref(), (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let n_epochs = history.train.len().max(history.validation.len()).max(1);
    let (min_y, max_y) = value_range(history.train.iter().chain(&history.validation));

    let mut chart = ChartBuilder::on(&root)
        .caption("Network loss", ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(0usize..n_epochs, min_y..max_y)?;

    chart
        .configure_mesh()
        .x_desc("Epoch")
        .y_desc("MSE")
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            history.train.iter().enumerate().map(|(i, v)| (i, *v)),
            &BLUE,
        ))?
        .label("Training loss")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    if !history.validation.is_empty() {
        chart
            .draw_series(LineSeries::new(
                history.validation.iter().enumerate().map(|(i, v)| (i, *v)),
                &MAGENTA,
            ))?
            .label("Validation loss")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &MAGENTA));
    }

    chart.configure_series_labels().border_style(&BLACK).draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_pads_and_skips_nan() {
        let values = [1.0, f64::NAN, 3.0];
        let (lo, hi) = value_range(values.iter());
        assert!(lo < 1.0 && hi > 3.0);

        let empty: [f64; 0] = [];
        assert_eq!(value_range(empty.iter()), (0.0, 1.0));
    }
}
