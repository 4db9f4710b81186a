use std::fmt::Write;

use crate::model::{WasteCategory, POINTS_AWARD};

const USER_INSTRUCTION: &str = "Analyze this waste image.";

/// Instructions sent alongside every image.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
    instruction: &'static str,
}

impl PromptTemplate {
    /// The waste-segregation task, rendered from the category taxonomy.
    pub fn waste_segregation() -> Self {
        let labels: Vec<&str> = WasteCategory::ALL.iter().map(|c| c.label()).collect();

        let mut system = String::from("You are an AI-based Waste Segregation Assistant.\n\n");
        system.push_str("Follow these steps strictly:\n");
        system.push_str("1. Identify the waste object.\n");
        let _ = writeln!(system, "2. Classify it as exactly one of: {}.", labels.join(", "));
        system.push_str("3. Assign the highlight color for that category:\n");
        for category in WasteCategory::ALL {
            let _ = writeln!(
                system,
                "   {:?} = {}",
                category.highlight_color(),
                category.label()
            );
        }
        system.push_str("4. Recommend the correct dustbin color.\n");
        system.push_str("5. Give one simple disposal tip.\n");
        let _ = writeln!(system, "6. Award {} points.", POINTS_AWARD);
        system.push_str("\nRespond ONLY with a JSON object of this shape:\n");
        let _ = write!(
            system,
            "{{\n  \"object\": \"\",\n  \"category\": \"\",\n  \"highlight_color\": \"\",\n  \"bin\": \"\",\n  \"tip\": \"\",\n  \"points\": {}\n}}\n",
            POINTS_AWARD
        );

        Self {
            system,
            instruction: USER_INSTRUCTION,
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn instruction(&self) -> &str {
        self.instruction
    }
}
