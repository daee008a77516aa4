//! Warehouse stock per product presentation.
//!
//! Sale lines draw boxes from stock. A line can only be recorded or grown
//! when enough boxes are on hand; shrinking or removing a line gives boxes
//! back.

use crate::error::StockError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Boxes of one presentation committed to a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: Uuid,
    pub presentation: String,
    pub boxes: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockBook {
    levels: BTreeMap<String, u32>,
    lines: BTreeMap<Uuid, SaleLine>,
}

impl StockBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add received boxes, creating the stock record if needed.
    pub fn receive(&mut self, presentation: impl Into<String>, boxes: u32) {
        let presentation = presentation.into();
        let level = self.levels.entry(presentation.clone()).or_insert(0);
        *level = level.saturating_add(boxes);
        debug!("stock {}: received {}, now {}", presentation, boxes, level);
    }

    /// Boxes on hand, `None` when the presentation has no stock record.
    pub fn level(&self, presentation: &str) -> Option<u32> {
        self.levels.get(presentation).copied()
    }

    pub fn line(&self, id: Uuid) -> Option<&SaleLine> {
        self.lines.get(&id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &SaleLine> {
        self.lines.values()
    }

    /// Record a new sale line, taking its boxes out of stock.
    pub fn record_sale_line(
        &mut self,
        presentation: impl Into<String>,
        boxes: u32,
    ) -> Result<Uuid, StockError> {
        let presentation = presentation.into();
        self.take(&presentation, boxes)?;
        let line = SaleLine {
            id: Uuid::new_v4(),
            presentation,
            boxes,
        };
        let id = line.id;
        self.lines.insert(id, line);
        Ok(id)
    }

    /// Change the box count of a line. Only the difference moves stock.
    pub fn amend_sale_line(&mut self, id: Uuid, boxes: u32) -> Result<(), StockError> {
        let line = self.lines.get(&id).ok_or(StockError::UnknownLine(id))?;
        let presentation = line.presentation.clone();
        let previous = line.boxes;

        if boxes > previous {
            self.take(&presentation, boxes - previous)?;
        } else {
            self.give_back(&presentation, previous - boxes);
        }

        if let Some(line) = self.lines.get_mut(&id) {
            line.boxes = boxes;
        }
        Ok(())
    }

    /// Remove a line and return its boxes to stock.
    pub fn remove_sale_line(&mut self, id: Uuid) -> Result<SaleLine, StockError> {
        let line = self.lines.remove(&id).ok_or(StockError::UnknownLine(id))?;
        self.give_back(&line.presentation, line.boxes);
        Ok(line)
    }

    fn take(&mut self, presentation: &str, boxes: u32) -> Result<(), StockError> {
        if boxes == 0 {
            return Ok(());
        }
        let level = self
            .levels
            .get_mut(presentation)
            .ok_or_else(|| StockError::UnknownPresentation(presentation.to_string()))?;
        if *level < boxes {
            warn!(
                "stock {}: rejected {} boxes, only {} available",
                presentation, boxes, level
            );
            return Err(StockError::InsufficientStock {
                presentation: presentation.to_string(),
                requested: boxes,
                available: *level,
            });
        }
        *level -= boxes;
        Ok(())
    }

    // Stock that was deleted in the meantime is not recreated.
    fn give_back(&mut self, presentation: &str, boxes: u32) {
        if let Some(level) = self.levels.get_mut(presentation) {
            *level = level.saturating_add(boxes);
        }
    }
}
