use anyhow::Result;
use idea_canvas::{Board, ElementKind, ElementSeed, Point, Size, Template};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut board = Board::new();
    board.set_title("Weekend trip");
    board.load_template(Template::MindMap);
    println!("✓ {}", board.summary());

    // Hang a follow-up off the central idea
    let central = board
        .store()
        .elements()
        .next()
        .map(|e| e.id)
        .ok_or_else(|| anyhow::anyhow!("template produced no elements"))?;
    let budget = board
        .create_element(
            ElementKind::Document,
            Point::new(800.0, 250.0),
            ElementSeed::content("Budget"),
        )
        .ok_or_else(|| anyhow::anyhow!("element ids are exhausted"))?;
    board.create_connection(central, budget.id);
    println!("✓ Added {}", budget.id);

    board.select_only(budget.id);
    board.begin_drag();
    board.update_drag(Point::new(40.0, -20.0));
    board.end_drag();

    board.undo();
    board.undo();
    println!("✓ Undid drag and connection, can redo: {}", board.can_redo());

    board.fit_to_screen(Size::new(1280.0, 720.0));
    println!("✓ Zoom after fit: {:.2}", board.viewport().zoom);

    println!("\n{}", board.export_snapshot().to_json()?);
    Ok(())
}
