use clap::Parser;
use std::path::PathBuf;
use surfnet::config::{AnalysisParams, RasterFormat};
use surfnet::{DataMap, SurfaceNetwork, build_network, find_basin_saddles, render, synthetic};

/// Построение поверхностной сети (вершины, седловины, стоки) по карте высот
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML
    #[arg(short, long)]
    config: PathBuf,

    /// Путь для сохранения сети (по умолчанию берётся из конфигурации)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Путь для PNG-оверлея
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Загрузить сохранённую сеть вместо построения и заново отбраковать седловины
    #[arg(long)]
    load: Option<PathBuf>,
}

fn load_map(params: &AnalysisParams) -> Result<DataMap, Box<dyn std::error::Error>> {
    if let Some(settings) = &params.synthetic {
        println!(
            "Генерация синтетического рельефа (размер: {}×{}, сид {})...",
            settings.width, settings.height, settings.seed
        );
        return Ok(synthetic::generate(settings, params.geo)?);
    }
    let input = params
        .input
        .as_ref()
        .ok_or("в конфигурации нет ни [input], ни [synthetic]")?;
    println!("Загрузка растра {:?}...", input.path);
    let map = match input.format {
        RasterFormat::Png16 => {
            DataMap::load_png16(&input.path, input.units, input.nodata, params.geo)?
        }
        RasterFormat::RawI16 => DataMap::load_raw_i16(
            &input.path,
            input.width,
            input.height,
            input.units,
            input.nodata,
            params.geo,
        )?,
    };
    Ok(map)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    println!("🔍 Загрузка конфигурации...");
    let config_path = cli.config.to_str().ok_or("путь к конфигурации не в UTF-8")?;
    let params = AnalysisParams::from_toml_file(config_path)?;
    let map = load_map(&params)?;

    let network = if let Some(saved) = &cli.load {
        println!("Загрузка сети из {saved:?}...");
        let mut network = SurfaceNetwork::load_json(saved, &map)?;
        let removed = find_basin_saddles(&mut network);
        println!("Повторная отбраковка: {removed} седловин");
        network
    } else {
        println!("Построение сети (размер: {}×{})...", map.width, map.height);
        build_network(&map)
    };

    let stats = network.stats();
    println!(
        "Вершин: {}, седловин: {} (отбраковано {}), стоков: {}, рёбер: {}",
        stats.summits, stats.saddles, stats.disqualified_saddles, stats.runoffs, stats.linkers
    );

    let output = cli.output.unwrap_or_else(|| params.output.network.clone());
    println!("Сохранение сети в {output:?}");
    network.save_json(&map, &output)?;

    if let Some(overlay) = cli.overlay.or(params.output.overlay) {
        println!("Сохранение оверлея в {overlay:?}");
        render::render_overlay(&map, &network, &overlay)?;
    }

    println!("\nГотово! Сеть сохранена.");
    Ok(())
}
