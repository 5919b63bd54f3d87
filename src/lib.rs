pub mod basin;
pub mod config;
pub mod datamap;
pub mod discovery;
pub mod error;
pub mod feature;
pub mod point;
pub mod render;
pub mod synthetic;
pub mod timing;
pub mod walk;

pub use basin::find_basin_saddles;
pub use config::{AnalysisParams, ElevationUnit, GeoSettings, RasterFormat};
pub use datamap::DataMap;
pub use discovery::discover;
pub use error::{Result, SurfaceError};
pub use feature::{SaddleId, SummitId, SurfaceNetwork};
pub use walk::walk;

/// Полный конвейер: поиск объектов, подъём к вершинам, отбраковка седловин
#[must_use]
pub fn build_network(map: &DataMap) -> SurfaceNetwork {
    let _t = timing::Timed::info("Построение поверхностной сети");
    let mut network = discover(map);
    walk(map, &mut network);
    find_basin_saddles(&mut network);

    let stats = network.stats();
    log::info!(
        "Сеть: {} вершин, {} седловин ({} отбраковано), {} стоков, {} рёбер",
        stats.summits,
        stats.saddles,
        stats.disqualified_saddles,
        stats.runoffs,
        stats.linkers
    );
    network
}
