// ==========================================
// 租赁清单抽取引擎 - 表头行检测
// ==========================================
// 职责: 在工作表前 N 行中定位表头行；合并两行叠放表头
// ==========================================

use crate::domain::workbook::Grid;
use crate::importer::header_mapper::HeaderMapper;

/// 表头行位置与单元格文本
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRow {
    /// 0 起始行号
    pub index: usize,
    pub cells: Vec<String>,
}

pub struct HeaderDetector {
    mapper: HeaderMapper,
    min_matches: usize,
}

impl HeaderDetector {
    pub fn new(mapper: HeaderMapper, min_matches: usize) -> Self {
        Self {
            mapper,
            min_matches,
        }
    }

    fn row_texts(grid: &Grid, index: usize) -> Vec<String> {
        grid.row(index).iter().map(|cell| cell.as_text()).collect()
    }

    /// 识别表头行：可映射单元格最多的行（平局取靠前者），且不少于 min_matches
    pub fn find_header_row(&self, grid: &Grid, max_rows: usize) -> Option<HeaderRow> {
        let mut best: Option<(usize, usize)> = None;

        for index in 0..grid.row_count().min(max_rows) {
            let score = grid
                .row(index)
                .iter()
                .filter(|cell| !cell.is_blank())
                .filter(|cell| self.mapper.map_header(&cell.as_text()).is_some())
                .count();

            if score > best.map_or(0, |(_, s)| s) {
                best = Some((index, score));
            }
        }

        match best {
            Some((index, score)) if score >= self.min_matches => Some(HeaderRow {
                index,
                cells: Self::row_texts(grid, index),
            }),
            _ => None,
        }
    }

    /// 两行叠放表头合并：上一行与表头行同列文本以空格拼接，缺一取另一
    pub fn handle_multi_level_headers(&self, grid: &Grid, header_row: usize) -> Vec<String> {
        let current = Self::row_texts(grid, header_row);
        if header_row == 0 {
            return current;
        }

        let previous = Self::row_texts(grid, header_row - 1);
        let width = current.len().max(previous.len());

        (0..width)
            .map(|col| {
                let upper = previous.get(col).map(|s| s.trim()).unwrap_or("");
                let lower = current.get(col).map(|s| s.trim()).unwrap_or("");
                match (upper.is_empty(), lower.is_empty()) {
                    (false, false) => format!("{} {}", upper, lower),
                    (true, _) => lower.to_string(),
                    (false, true) => upper.to_string(),
                }
            })
            .collect()
    }
}
