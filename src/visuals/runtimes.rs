use ctp_eval::{
    stats::{summarize, SizeSummary},
    table::read_records,
};
use glob::glob;
use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let pattern = "eval_results_*/ctp_results*_all.csv";

    for entry in glob(pattern)? {
        let path = entry?;
        let output_dir = path.parent().ok_or("Invalid path")?.join("plots");
        std::fs::create_dir_all(&output_dir)?;

        let summary = summarize(&read_records(&path)?);
        if summary.is_empty() {
            continue;
        }
        let file_name = path.file_stem().ok_or("Invalid file name")?.to_str().ok_or("Invalid file name")?;
        create_runtime_plot(&summary, file_name, &output_dir)?;
    }

    Ok(())
}

fn create_runtime_plot(data: &[SizeSummary], plot_name: &str, output_dir: &Path) -> Result<(), Box<dyn Error>> {
    let output_file = output_dir.join(format!("{}_runtime_plot.png", plot_name));
    let root = BitMapBackend::new(&output_file, (640, 480)).into_drawing_area();
    root.fill(&WHITE)?;

    let series: [(&str, Vec<(usize, f64)>); 2] = [
        ("MCVI", data.iter().filter_map(|s| s.mcvi_runtime.filter(|t| t.is_finite()).map(|t| (s.nodes, t))).collect()),
        ("AO*", data.iter().filter_map(|s| s.ao_star_runtime.filter(|t| t.is_finite()).map(|t| (s.nodes, t))).collect()),
    ];

    let max_nodes = data.iter().map(|s| s.nodes).max().unwrap_or(0) + 1;
    let max_time = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|&(_, t)| t))
        .fold(1.0f64, f64::max);

    let margin = 20;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Mean runtime: {}", plot_name), ("sans-serif", 30).into_font())
        .margin(margin)
        .x_label_area_size(35)
        .y_label_area_size(40)
        .build_cartesian_2d(0..max_nodes, 0f64..max_time * 1.1)?;

    chart.configure_mesh()
        .x_desc("Nodes")
        .y_desc("Runtime (s)")
        .draw()?;

    for (color_index, (algorithm, points)) in series.into_iter().enumerate() {
        let color = Palette99::pick(color_index);
        chart.draw_series(
            LineSeries::new(points, &color)
        )?.label(algorithm)
         .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }

    chart.configure_series_labels()
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()?;

    Ok(())
}
