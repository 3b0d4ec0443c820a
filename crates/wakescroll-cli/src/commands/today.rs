use wakescroll_core::WakeScroll;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;
    println!("{}", serde_json::to_string_pretty(&app.today())?);
    Ok(())
}
