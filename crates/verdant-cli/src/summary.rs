use console::Style;
use verdant_core::pipeline::config::PipelineConfig;
use verdant_core::pipeline::PipelineOutput;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
    warning: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
            warning: Style::new().yellow(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Verdant Composites"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(18)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Catalog"),
        s.path.apply_to(config.catalog.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    println!();

    // Search
    let [w, so, e, n] = config.search.bbox;
    println!("  {}", s.header.apply_to("Search"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("BBox"),
        s.value.apply_to(format!("{w}, {so}, {e}, {n}"))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Dates"),
        s.value
            .apply_to(format!("{} .. {}", config.search.start, config.search.end))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Cloud"),
        s.value
            .apply_to(format!("< {}%", config.search.cloud_cover_max))
    );
    println!();

    // Mask
    println!("  {}", s.header.apply_to("Quality Mask"));
    if config.mask.flags.is_empty() && config.mask.extra_bits.is_empty() {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Flags"),
            s.disabled.apply_to("disabled")
        );
    } else {
        let flags: Vec<String> = config.mask.flags.iter().map(ToString::to_string).collect();
        println!(
            "    {:<12}{}",
            s.label.apply_to("Flags"),
            s.value.apply_to(flags.join(", "))
        );
        if !config.mask.extra_bits.is_empty() {
            println!(
                "    {:<12}{:?}",
                s.label.apply_to("Extra bits"),
                config.mask.extra_bits
            );
        }
    }
    println!();

    // Stacking / indices / aggregation
    println!("  {}", s.header.apply_to("Processing"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Resampling"),
        s.method.apply_to(config.stacking.resampling)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Scaling"),
        s.method.apply_to(config.stacking.scaling)
    );
    if let Some(grid) = config.stacking.grid {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Grid"),
            s.value.apply_to(grid)
        );
    }
    let indices: Vec<String> = config.indices.iter().map(ToString::to_string).collect();
    println!(
        "    {:<12}{}",
        s.label.apply_to("Indices"),
        s.value.apply_to(indices.join(", "))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Weighting"),
        s.method.apply_to(config.aggregation.weighting)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Format"),
        s.value.apply_to(config.output.format)
    );
    println!();
}

pub fn print_results(output: &PipelineOutput) {
    let s = Styles::new();

    println!();
    println!(
        "  {} {}",
        s.header.apply_to("Scenes"),
        s.value.apply_to(format!("{} on grid {}", output.scenes.len(), output.grid))
    );
    println!();

    for result in &output.indices {
        let composites = &result.composites;
        println!("  {}", s.header.apply_to(composites.kind));
        for (season, c) in composites.iter() {
            let mean = c
                .spatial_mean()
                .map(|m| format!("{m:.3}"))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "    {:<8}{:>4} obs  {:>8} valid px  mean {}",
                s.label.apply_to(season),
                s.value.apply_to(c.observations),
                c.valid_pixels(),
                s.value.apply_to(mean)
            );
        }
        for warning in &composites.warnings {
            println!("    {}", s.warning.apply_to(warning));
        }
        println!();
    }
}
