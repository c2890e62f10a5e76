//! Native viewer: `flamelens [frame-tree.json] [render-options.json]`.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context as _;
    use flamelens_core::RenderOptions;
    use log::LevelFilter;
    use simple_logger::SimpleLogger;

    SimpleLogger::new().with_level(LevelFilter::Info).env().init()?;

    let mut args = std::env::args().skip(1);
    let tree = args
        .next()
        .map(|path| std::fs::read(&path).with_context(|| format!("reading {path}")))
        .transpose()?;
    let options = match args.next() {
        Some(path) => {
            let data = std::fs::read(&path).with_context(|| format!("reading {path}"))?;
            serde_json::from_slice::<RenderOptions>(&data)
                .with_context(|| format!("parsing render options from {path}"))?
        }
        None => RenderOptions::default(),
    };

    eframe::run_native(
        "flamelens",
        eframe::NativeOptions::default(),
        Box::new(move |cc| {
            let mut app = flamelens_ui::FlameApp::new(cc, options);
            if let Some(data) = &tree {
                app.load_tree(data);
            }
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("viewer exited with an error: {e}"))
}

#[cfg(target_arch = "wasm32")]
fn main() {}
