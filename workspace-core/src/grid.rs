use crate::error::WorkspaceCoreError;
use crate::host::{CellHandle, GridId, GridLayout, GridOptions, WidgetContent, WidgetOptions};
use crate::style;
use std::collections::HashMap;
use workspace::Rect;

/// The real cell for a guid. Exactly one exists per guid across all grids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCell {
    pub guid: String,
    /// Tab the cell is rendered in. Pinned cells follow the active tab.
    pub tab_id: String,
    /// Tab the cell belongs to. Hops never change it.
    pub owner_tab: String,
    pub handle: CellHandle,
    pub rect: Option<Rect>,
    pub locked: bool,
    pub is_empty: bool,
    pub to_fix_panel: bool,
}

/// Placeholder standing in for a pinned panel whose real cell is elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneCell {
    pub tab_id: String,
    pub handle: CellHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSpec {
    pub guid: String,
    pub rect: Option<Rect>,
    pub auto_position: bool,
    pub locked: bool,
    pub to_fix_panel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSettings {
    pub column: u32,
    pub float: bool,
    pub cell_height: String,
    pub edit_margin: u32,
    pub view_margin: u32,
}

/// One grid per tab plus a guid-keyed index of real and clone cells.
#[derive(Debug)]
pub struct GridSurfaceManager {
    grids: Vec<(String, GridId)>,
    cells: Vec<GridCell>,
    clones: HashMap<String, Vec<CloneCell>>,
    settings: GridSettings,
    edit_mode: bool,
}

impl GridSurfaceManager {
    pub fn new(settings: GridSettings) -> Self {
        Self {
            grids: Vec::new(),
            cells: Vec::new(),
            clones: HashMap::new(),
            settings,
            edit_mode: false,
        }
    }

    fn margin(&self) -> u32 {
        if self.edit_mode {
            self.settings.edit_margin
        } else {
            self.settings.view_margin
        }
    }

    fn grid_options(&self) -> GridOptions {
        GridOptions {
            float: self.settings.float,
            cell_height: self.settings.cell_height.clone(),
            margin: self.margin(),
            static_grid: !self.edit_mode,
            column: self.settings.column,
        }
    }

    fn widget_options(guid: &str, rect: Option<Rect>, auto_position: bool, locked: bool) -> WidgetOptions {
        WidgetOptions {
            id: guid.to_string(),
            rect,
            auto_position,
            locked,
            no_move: locked,
            no_resize: locked,
        }
    }

    fn clone_options(guid: &str, rect: Option<Rect>) -> WidgetOptions {
        WidgetOptions {
            id: guid.to_string(),
            rect,
            auto_position: rect.is_none(),
            locked: true,
            no_move: true,
            no_resize: true,
        }
    }

    /// Creates the grid for a newly added tab and gives it clones of every
    /// pinned panel. Returns the existing grid when the tab already has one.
    pub fn add_tab_grid(&mut self, layout: &mut dyn GridLayout, tab_id: &str) -> GridId {
        if let Some(grid) = self.grid_for(tab_id) {
            return grid;
        }
        let grid = layout.init(tab_id, &self.grid_options());
        self.grids.push((tab_id.to_string(), grid));
        let pinned: Vec<String> = self
            .cells
            .iter()
            .filter(|cell| cell.to_fix_panel)
            .map(|cell| cell.guid.clone())
            .collect();
        for guid in pinned {
            self.create_clones(layout, &guid);
        }
        grid
    }

    /// Destroys a tab's grid with every cell it owns. Pinned panels only
    /// visiting the tab go back to their owner first; pinned panels owned by
    /// it are removed wherever they are shown. Returns the guids of the real
    /// cells removed.
    pub fn remove_tab_grid(&mut self, layout: &mut dyn GridLayout, tab_id: &str) -> Vec<String> {
        let Some(grid) = self.grid_for(tab_id) else {
            log::warn!("no grid for tab '{tab_id}'");
            return Vec::new();
        };
        let visitors: Vec<(String, String)> = self
            .cells
            .iter()
            .filter(|cell| cell.to_fix_panel && cell.tab_id == tab_id && cell.owner_tab != tab_id)
            .map(|cell| (cell.guid.clone(), cell.owner_tab.clone()))
            .collect();
        for (guid, owner) in visitors {
            if !self.move_pinned(layout, &guid, &owner) {
                log::warn!("pinned panel '{guid}' could not return to tab '{owner}'");
            }
        }
        for clones in self.clones.values_mut() {
            clones.retain(|clone| {
                if clone.tab_id == tab_id {
                    layout.remove_widget(clone.handle.grid, clone.handle.cell);
                    false
                } else {
                    true
                }
            });
        }
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.cells.len());
        for cell in self.cells.drain(..) {
            let owned_pin = cell.to_fix_panel && cell.owner_tab == tab_id;
            if cell.tab_id == tab_id || owned_pin {
                layout.remove_widget(cell.handle.grid, cell.handle.cell);
                removed.push(cell);
            } else {
                kept.push(cell);
            }
        }
        self.cells = kept;
        for cell in &removed {
            if cell.to_fix_panel {
                self.delete_clones(layout, &cell.guid);
            }
        }
        self.clones.retain(|_, clones| !clones.is_empty());
        layout.destroy(grid);
        self.grids.retain(|(id, _)| id != tab_id);
        removed.into_iter().map(|cell| cell.guid).collect()
    }

    pub fn create_cell(
        &mut self,
        layout: &mut dyn GridLayout,
        tab_id: &str,
        spec: CellSpec,
        content: WidgetContent,
    ) -> Result<CellHandle, WorkspaceCoreError> {
        let grid = self
            .grid_for(tab_id)
            .ok_or_else(|| WorkspaceCoreError::UnknownTab(tab_id.to_string()))?;
        if self.cell(&spec.guid).is_some() {
            return Err(WorkspaceCoreError::CellOccupied(spec.guid));
        }
        let is_empty = !matches!(content, WidgetContent::Panel { .. });
        let options = Self::widget_options(&spec.guid, spec.rect, spec.auto_position, spec.locked);
        let cell = layout.add_widget(grid, content, &options);
        let handle = CellHandle { grid, cell };
        let rect = layout.position(grid, cell).or(spec.rect);
        self.cells.push(GridCell {
            guid: spec.guid.clone(),
            tab_id: tab_id.to_string(),
            owner_tab: tab_id.to_string(),
            handle,
            rect,
            locked: spec.locked,
            is_empty,
            to_fix_panel: spec.to_fix_panel,
        });
        if spec.to_fix_panel {
            self.create_clones(layout, &spec.guid);
        }
        Ok(handle)
    }

    /// Detaches the real cell and all its clones. Panel teardown is the
    /// caller's job.
    pub fn remove_cell(&mut self, layout: &mut dyn GridLayout, guid: &str) -> Option<GridCell> {
        let index = self.cells.iter().position(|cell| cell.guid == guid)?;
        let cell = self.cells.remove(index);
        layout.remove_widget(cell.handle.grid, cell.handle.cell);
        self.delete_clones(layout, guid);
        Some(cell)
    }

    pub fn set_cell_content(
        &mut self,
        layout: &mut dyn GridLayout,
        guid: &str,
        content: WidgetContent,
    ) -> Result<(), WorkspaceCoreError> {
        let cell = self
            .cells
            .iter_mut()
            .find(|cell| cell.guid == guid)
            .ok_or_else(|| WorkspaceCoreError::UnknownCell(guid.to_string()))?;
        cell.is_empty = !matches!(content, WidgetContent::Panel { .. });
        layout.set_content(cell.handle.grid, cell.handle.cell, content);
        Ok(())
    }

    /// Moves the index entries of `old` to `new` when the runtime assigned a
    /// guid other than the one the cell was created with.
    pub fn rekey(&mut self, layout: &mut dyn GridLayout, old: &str, new: &str) {
        if old == new {
            return;
        }
        if let Some(cell) = self.cells.iter_mut().find(|cell| cell.guid == old) {
            cell.guid = new.to_string();
            let options = Self::widget_options(new, cell.rect, false, cell.locked);
            layout.update(cell.handle.grid, cell.handle.cell, &options);
        }
        if let Some(clones) = self.clones.remove(old) {
            self.clones.insert(new.to_string(), clones);
        }
    }

    pub fn set_fixed(
        &mut self,
        layout: &mut dyn GridLayout,
        guid: &str,
        fixed: bool,
    ) -> Result<(), WorkspaceCoreError> {
        let cell = self
            .cells
            .iter_mut()
            .find(|cell| cell.guid == guid)
            .ok_or_else(|| WorkspaceCoreError::UnknownCell(guid.to_string()))?;
        cell.to_fix_panel = fixed;
        if !fixed {
            cell.owner_tab = cell.tab_id.clone();
        }
        if fixed {
            self.create_clones(layout, guid);
        } else {
            self.delete_clones(layout, guid);
        }
        Ok(())
    }

    /// Adds a clone of the real cell to every other tab lacking one.
    pub fn create_clones(&mut self, layout: &mut dyn GridLayout, guid: &str) -> usize {
        let Some(real) = self.cell(guid).cloned() else {
            return 0;
        };
        let rect = layout
            .position(real.handle.grid, real.handle.cell)
            .or(real.rect);
        let mut created = 0;
        for (tab_id, grid) in self.grids.clone() {
            if tab_id == real.tab_id {
                continue;
            }
            let clones = self.clones.entry(guid.to_string()).or_default();
            if clones.iter().any(|clone| clone.tab_id == tab_id) {
                continue;
            }
            let cell = layout.add_widget(
                grid,
                WidgetContent::Clone {
                    guid: guid.to_string(),
                },
                &Self::clone_options(guid, rect),
            );
            clones.push(CloneCell {
                tab_id,
                handle: CellHandle { grid, cell },
            });
            created += 1;
        }
        created
    }

    pub fn delete_clones(&mut self, layout: &mut dyn GridLayout, guid: &str) -> usize {
        let Some(clones) = self.clones.remove(guid) else {
            return 0;
        };
        for clone in &clones {
            layout.remove_widget(clone.handle.grid, clone.handle.cell);
        }
        clones.len()
    }

    /// Relocates every pinned panel into `active_tab`: the clone there
    /// receives the rendered content and the previous real cell becomes the
    /// clone. Returns the guids that moved.
    pub fn change_fixed_panel_position(
        &mut self,
        layout: &mut dyn GridLayout,
        active_tab: &str,
    ) -> Vec<String> {
        let pinned: Vec<String> = self
            .cells
            .iter()
            .filter(|cell| cell.to_fix_panel && cell.tab_id != active_tab)
            .map(|cell| cell.guid.clone())
            .collect();
        pinned
            .into_iter()
            .filter(|guid| self.move_pinned(layout, guid, active_tab))
            .collect()
    }

    /// Swaps the real cell of a pinned panel with its clone in `target_tab`.
    fn move_pinned(&mut self, layout: &mut dyn GridLayout, guid: &str, target_tab: &str) -> bool {
        let has_clone = self
            .clones
            .get(guid)
            .map(|clones| clones.iter().any(|clone| clone.tab_id == target_tab))
            .unwrap_or(false);
        if !has_clone {
            self.create_clones(layout, guid);
        }
        let Some(clones) = self.clones.get_mut(guid) else {
            return false;
        };
        let Some(clone_index) = clones.iter().position(|clone| clone.tab_id == target_tab) else {
            return false;
        };
        let Some(real) = self.cells.iter_mut().find(|cell| cell.guid == guid) else {
            return false;
        };
        let target = clones.remove(clone_index);
        let target_rect = layout.position(target.handle.grid, target.handle.cell);
        let previous_rect = layout
            .position(real.handle.grid, real.handle.cell)
            .or(real.rect);
        layout.transfer_content(
            real.handle,
            target.handle,
            WidgetContent::Clone {
                guid: guid.to_string(),
            },
        );
        layout.update(
            target.handle.grid,
            target.handle.cell,
            &Self::widget_options(guid, target_rect, false, real.locked),
        );
        layout.update(
            real.handle.grid,
            real.handle.cell,
            &Self::clone_options(guid, previous_rect),
        );
        clones.push(CloneCell {
            tab_id: std::mem::replace(&mut real.tab_id, target.tab_id),
            handle: std::mem::replace(&mut real.handle, target.handle),
        });
        real.rect = target_rect.or(previous_rect);
        log::debug!("pinned panel '{guid}' moved to tab '{target_tab}'");
        true
    }

    /// Applies a column count to every grid and returns the stylesheet that
    /// goes with it.
    pub fn set_column(
        &mut self,
        layout: &mut dyn GridLayout,
        columns: u32,
    ) -> Result<String, WorkspaceCoreError> {
        if columns == 0 {
            return Err(WorkspaceCoreError::InvalidColumn);
        }
        self.settings.column = columns;
        for (_, grid) in &self.grids {
            layout.column(*grid, columns);
        }
        let css = style::column_stylesheet(columns);
        layout.inject_stylesheet(style::COLUMN_STYLESHEET_ID, &css);
        Ok(css)
    }

    /// Switches every grid to `desired`, or flips the current mode when
    /// `None`. Returns the resulting mode.
    pub fn set_edit_mode(&mut self, layout: &mut dyn GridLayout, desired: Option<bool>) -> bool {
        let next = desired.unwrap_or(!self.edit_mode);
        self.edit_mode = next;
        let margin = self.margin();
        for (_, grid) in &self.grids {
            layout.batch_update(*grid);
            layout.margin(*grid, margin);
            layout.commit(*grid);
            layout.set_static(*grid, !next);
        }
        next
    }

    pub fn compact_all(&mut self, layout: &mut dyn GridLayout) {
        for (_, grid) in &self.grids {
            layout.compact(*grid);
        }
        for cell in &mut self.cells {
            if let Some(rect) = layout.position(cell.handle.grid, cell.handle.cell) {
                cell.rect = Some(rect);
            }
        }
    }

    /// Reads the current rectangle back from the layout.
    pub fn refresh_rect(&mut self, layout: &dyn GridLayout, guid: &str) -> Option<Rect> {
        let cell = self.cells.iter_mut().find(|cell| cell.guid == guid)?;
        if let Some(rect) = layout.position(cell.handle.grid, cell.handle.cell) {
            cell.rect = Some(rect);
        }
        cell.rect
    }

    /// Removes every cell and grid.
    pub fn clear(&mut self, layout: &mut dyn GridLayout) {
        for (_, clones) in self.clones.drain() {
            for clone in clones {
                layout.remove_widget(clone.handle.grid, clone.handle.cell);
            }
        }
        for cell in self.cells.drain(..) {
            layout.remove_widget(cell.handle.grid, cell.handle.cell);
        }
        for (_, grid) in self.grids.drain(..) {
            layout.destroy(grid);
        }
    }

    pub fn grid_for(&self, tab_id: &str) -> Option<GridId> {
        self.grids
            .iter()
            .find(|(id, _)| id == tab_id)
            .map(|(_, grid)| *grid)
    }

    pub fn cell(&self, guid: &str) -> Option<&GridCell> {
        self.cells.iter().find(|cell| cell.guid == guid)
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cells_in_tab<'a>(&'a self, tab_id: &'a str) -> impl Iterator<Item = &'a GridCell> + 'a {
        self.cells.iter().filter(move |cell| cell.tab_id == tab_id)
    }

    pub fn clones_of(&self, guid: &str) -> &[CloneCell] {
        self.clones.get(guid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn guids(&self) -> Vec<String> {
        self.cells.iter().map(|cell| cell.guid.clone()).collect()
    }

    pub fn column(&self) -> u32 {
        self.settings.column
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }
}
