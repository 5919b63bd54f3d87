// src/discovery/plateau.rs
//! Заливка плато: максимальная связная область клеток одной высоты

use rustc_hash::FxHashSet;

use crate::datamap::DataMap;
use crate::point::GridPoint;

/// Учёт уже посещённых клеток
pub trait Explored {
    fn is_explored(&self, x: i32, y: i32) -> bool;
    fn mark(&mut self, x: i32, y: i32);
}

/// Плотная битовая карта посещённых клеток на весь растр
#[derive(Debug, Clone)]
pub struct ExploredMap {
    width: usize,
    cells: Vec<bool>,
}

impl ExploredMap {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            cells: vec![false; width * height],
        }
    }

    #[must_use]
    pub fn for_map(map: &DataMap) -> Self {
        Self::new(map.width, map.height)
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

impl Explored for ExploredMap {
    fn is_explored(&self, x: i32, y: i32) -> bool {
        self.cells[y as usize * self.width + x as usize]
    }

    fn mark(&mut self, x: i32, y: i32) {
        self.cells[y as usize * self.width + x as usize] = true;
    }
}

impl Explored for FxHashSet<(i32, i32)> {
    fn is_explored(&self, x: i32, y: i32) -> bool {
        self.contains(&(x, y))
    }

    fn mark(&mut self, x: i32, y: i32) {
        self.insert((x, y));
    }
}

/// Плато и его более высокий периметр
#[derive(Debug, Clone, PartialEq)]
pub struct Plateau {
    pub elevation: f32,
    pub points: Vec<GridPoint>,
    /// Строго более высокие соседи плато, без повторов, в порядке обнаружения
    pub perimeter: Vec<GridPoint>,
}

impl Plateau {
    /// Самая высокая точка периметра (первая при равенстве)
    #[must_use]
    pub fn highest_exit(&self) -> Option<GridPoint> {
        crate::point::highest(&self.perimeter).copied()
    }
}

/// Заливает плато от `seed`, отмечая каждую клетку в `explored`.
///
/// Используется явный стек: плато бывают огромными. Затравка включается в плато
/// даже если уже отмечена; прочие отмеченные клетки не посещаются повторно.
pub fn fill_plateau<E: Explored>(map: &DataMap, seed: GridPoint, explored: &mut E) -> Plateau {
    let elevation = seed.elevation;
    let mut points = vec![seed];
    let mut perimeter = Vec::new();
    let mut perimeter_seen: FxHashSet<(i32, i32)> = FxHashSet::default();
    let mut stack = vec![seed];
    explored.mark(seed.x, seed.y);

    while let Some(current) = stack.pop() {
        for n in map.iterate_full(current.x, current.y) {
            let Some(e) = n.elevation else { continue };
            if e == elevation {
                if !explored.is_explored(n.x, n.y) {
                    explored.mark(n.x, n.y);
                    let p = GridPoint::new(n.x, n.y, e);
                    points.push(p);
                    stack.push(p);
                }
            } else if e > elevation && perimeter_seen.insert((n.x, n.y)) {
                perimeter.push(GridPoint::new(n.x, n.y, e));
            }
        }
    }

    Plateau {
        elevation,
        points,
        perimeter,
    }
}
