use clap::Subcommand;
use wakescroll_core::WakeScroll;

#[derive(Subcommand)]
pub enum ReflectAction {
    /// Write a reflection
    Add {
        /// Reflection text
        text: String,
        /// Mood from 1 to 5
        #[arg(long)]
        mood: Option<u8>,
        /// Prompt that was answered
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Today's reflections
    Today,
    /// All stored reflections
    List,
    /// Delete a reflection
    Delete {
        /// Event ID
        id: String,
    },
}

pub fn run(action: ReflectAction) -> Result<(), Box<dyn std::error::Error>> {
    let app = WakeScroll::open()?;

    match action {
        ReflectAction::Add { text, mood, prompt } => {
            let written = app.submit_reflection(&text, mood, prompt)?;
            println!("{}", serde_json::to_string_pretty(&written)?);
        }
        ReflectAction::Today => {
            let today = app.reflections().todays_reflections();
            println!("{}", serde_json::to_string_pretty(&today)?);
        }
        ReflectAction::List => {
            let all = app.reflections().reflections();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        ReflectAction::Delete { id } => {
            if !app.reflections().delete(&id) {
                return Err(format!("reflection not found: {id}").into());
            }
            println!("deleted: {id}");
        }
    }
    Ok(())
}
