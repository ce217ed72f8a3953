use workspace::Rect;
use workspace_core::headless::HeadlessGrid;
use workspace_core::{
    CellSpec, GridLayout, GridSettings, GridSurfaceManager, WidgetContent, WorkspaceCoreError,
};

fn settings() -> GridSettings {
    GridSettings {
        column: 12,
        float: true,
        cell_height: "25px".to_string(),
        edit_margin: 10,
        view_margin: 0,
    }
}

fn spec(guid: &str, y: u32, pinned: bool) -> CellSpec {
    CellSpec {
        guid: guid.to_string(),
        rect: Some(Rect { x: 0, y, w: 6, h: 4 }),
        auto_position: false,
        locked: false,
        to_fix_panel: pinned,
    }
}

fn panel_content(guid: &str) -> WidgetContent {
    WidgetContent::Panel {
        selector: format!("#panel-{guid}"),
    }
}

#[test]
fn pinned_cell_is_cloned_into_every_other_tab() {
    let mut layout = HeadlessGrid::new();
    let mut grid = GridSurfaceManager::new(settings());
    for tab in ["a", "b", "c"] {
        grid.add_tab_grid(&mut layout, tab);
    }
    grid.create_cell(&mut layout, "b", spec("Chart_1", 0, true), panel_content("Chart_1"))
        .expect("cell");

    let mut clone_tabs: Vec<&str> = grid
        .clones_of("Chart_1")
        .iter()
        .map(|clone| clone.tab_id.as_str())
        .collect();
    clone_tabs.sort();
    assert_eq!(clone_tabs, vec!["a", "c"]);
    assert!(layout.widgets("a").iter().any(|w| w.content
        == WidgetContent::Clone {
            guid: "Chart_1".to_string()
        }));

    grid.add_tab_grid(&mut layout, "d");
    assert_eq!(grid.clones_of("Chart_1").len(), 3);
    assert_eq!(grid.guids(), vec!["Chart_1".to_string()]);
}

#[test]
fn pinned_panel_follows_the_active_tab() {
    let mut layout = HeadlessGrid::new();
    let mut grid = GridSurfaceManager::new(settings());
    grid.add_tab_grid(&mut layout, "a");
    grid.add_tab_grid(&mut layout, "b");
    grid.create_cell(&mut layout, "b", spec("Chart_1", 2, true), panel_content("Chart_1"))
        .expect("cell");

    let moved = grid.change_fixed_panel_position(&mut layout, "a");
    assert_eq!(moved, vec!["Chart_1".to_string()]);
    let real = grid.cell("Chart_1").expect("real cell");
    assert_eq!(real.tab_id, "a");
    assert_eq!(real.owner_tab, "b");
    assert_eq!(real.rect, Some(Rect { x: 0, y: 2, w: 6, h: 4 }));
    assert_eq!(grid.clones_of("Chart_1")[0].tab_id, "b");
    assert!(layout
        .widgets("a")
        .iter()
        .any(|w| w.content == panel_content("Chart_1")));
    assert!(layout.widgets("b").iter().all(|w| w.content != panel_content("Chart_1")));

    assert!(grid.change_fixed_panel_position(&mut layout, "a").is_empty());
}

#[test]
fn removing_a_tab_drops_its_cells_and_clones() {
    let mut layout = HeadlessGrid::new();
    let mut grid = GridSurfaceManager::new(settings());
    grid.add_tab_grid(&mut layout, "a");
    grid.add_tab_grid(&mut layout, "b");
    grid.create_cell(&mut layout, "a", spec("Chart_1", 0, true), panel_content("Chart_1"))
        .expect("pinned");
    grid.create_cell(&mut layout, "b", spec("Table_1", 0, false), panel_content("Table_1"))
        .expect("table");

    let removed = grid.remove_tab_grid(&mut layout, "b");
    assert_eq!(removed, vec!["Table_1".to_string()]);
    assert!(grid.clones_of("Chart_1").is_empty());
    assert!(grid.cell("Chart_1").is_some());
    assert_eq!(layout.grid_count(), 1);

    let removed = grid.remove_tab_grid(&mut layout, "a");
    assert_eq!(removed, vec!["Chart_1".to_string()]);
    assert!(grid.cells().is_empty());
}

#[test]
fn one_real_cell_per_guid() {
    let mut layout = HeadlessGrid::new();
    let mut grid = GridSurfaceManager::new(settings());
    grid.add_tab_grid(&mut layout, "a");
    grid.create_cell(&mut layout, "a", spec("Chart_1", 0, false), panel_content("Chart_1"))
        .expect("cell");
    let err = grid
        .create_cell(&mut layout, "a", spec("Chart_1", 4, false), panel_content("Chart_1"))
        .expect_err("duplicate guid");
    assert!(matches!(err, WorkspaceCoreError::CellOccupied(_)));
    let err = grid
        .create_cell(&mut layout, "zz", spec("Map_1", 0, false), WidgetContent::Placeholder)
        .expect_err("unknown tab");
    assert!(matches!(err, WorkspaceCoreError::UnknownTab(_)));
}

#[test]
fn column_change_applies_to_all_grids() {
    let mut layout = HeadlessGrid::new();
    let mut grid = GridSurfaceManager::new(settings());
    grid.add_tab_grid(&mut layout, "a");
    grid.add_tab_grid(&mut layout, "b");
    assert!(matches!(
        grid.set_column(&mut layout, 0),
        Err(WorkspaceCoreError::InvalidColumn)
    ));
    grid.set_column(&mut layout, 4).expect("columns");
    assert_eq!(layout.options("a").map(|o| o.column), Some(4));
    assert_eq!(layout.options("b").map(|o| o.column), Some(4));
    let css = layout.stylesheet("workspace-columns").expect("stylesheet");
    assert!(css.contains(".grid-stack-4"));
}

#[test]
fn edit_mode_switches_margin_and_static() {
    let mut layout = HeadlessGrid::new();
    let mut grid = GridSurfaceManager::new(settings());
    grid.add_tab_grid(&mut layout, "a");
    let options = layout.options("a").expect("grid");
    assert!(options.static_grid);
    assert_eq!(options.margin, 0);

    assert!(grid.set_edit_mode(&mut layout, Some(true)));
    assert!(grid.set_edit_mode(&mut layout, Some(true)));
    let options = layout.options("a").expect("grid");
    assert!(!options.static_grid);
    assert_eq!(options.margin, 10);

    assert!(!grid.set_edit_mode(&mut layout, None));
    assert_eq!(layout.options("a").map(|o| o.margin), Some(0));
}

#[test]
fn compaction_refreshes_stored_rects() {
    let mut layout = HeadlessGrid::new();
    let mut grid = GridSurfaceManager::new(settings());
    grid.add_tab_grid(&mut layout, "a");
    grid.create_cell(&mut layout, "a", spec("Chart_1", 10, false), panel_content("Chart_1"))
        .expect("cell");
    grid.compact_all(&mut layout);
    assert_eq!(
        grid.cell("Chart_1").and_then(|cell| cell.rect),
        Some(Rect { x: 0, y: 0, w: 6, h: 4 })
    );
}

#[test]
fn unpinning_removes_clones() {
    let mut layout = HeadlessGrid::new();
    let mut grid = GridSurfaceManager::new(settings());
    grid.add_tab_grid(&mut layout, "a");
    grid.add_tab_grid(&mut layout, "b");
    grid.create_cell(&mut layout, "a", spec("Chart_1", 0, false), panel_content("Chart_1"))
        .expect("cell");
    grid.set_fixed(&mut layout, "Chart_1", true).expect("pin");
    assert_eq!(grid.clones_of("Chart_1").len(), 1);
    grid.set_fixed(&mut layout, "Chart_1", false).expect("unpin");
    assert!(grid.clones_of("Chart_1").is_empty());
    assert!(layout.widgets("b").is_empty());
    let handle = grid.cell("Chart_1").expect("cell").handle;
    assert!(layout.position(handle.grid, handle.cell).is_some());
}
