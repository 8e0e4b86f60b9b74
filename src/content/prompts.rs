use serde_json::{json, Value};
use crate::models::LiturgicalColor;

pub fn reading_set_prompt(date_label: &str, language: &str) -> String {
    format!(
        "Act as an expert in the Catholic liturgy.\n\
         For {date}, provide the texts of the Mass from the Roman Lectionary, in {language}, \
         using the official liturgical translation where possible.\n\n\
         I absolutely need:\n\
         1. The first reading\n\
         2. The psalm\n\
         3. The gospel (the most important)\n\
         4. The liturgical color ({colors})\n\
         5. The name of the liturgical day (e.g. \"Tuesday of the 1st week of Advent\")\n\n\
         Return only valid JSON matching the schema.",
        date = date_label,
        language = language,
        colors = color_names().join(", "),
    )
}

pub fn reflection_prompt(gospel_text: &str, language: &str) -> String {
    format!(
        "Give a short spiritual meditation (about 150 words) in {} on this gospel. \
         Stay deep, inspiring and concrete for daily life:\n\n{}",
        language,
        gospel_text.trim()
    )
}

fn color_names() -> Vec<&'static str> {
    LiturgicalColor::ALL.iter().map(LiturgicalColor::as_str).collect()
}

fn reading_schema(text_description: Option<&str>) -> Value {
    let mut text = json!({ "type": "STRING" });
    if let Some(description) = text_description {
        text["description"] = json!(description);
    }
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "reference": { "type": "STRING" },
            "text": text
        }
    })
}

/// Output-shape constraint for the reading set call
pub fn reading_set_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "date": { "type": "STRING" },
            "liturgicalColor": { "type": "STRING", "enum": color_names() },
            "liturgicalDayName": { "type": "STRING" },
            "firstReading": reading_schema(Some("The complete text of the reading")),
            "psalm": reading_schema(None),
            "secondReading": reading_schema(None),
            "gospel": reading_schema(Some("The complete text of the gospel"))
        },
        "required": ["date", "liturgicalColor", "liturgicalDayName", "gospel"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_set_prompt_mentions_date_and_language() {
        let prompt = reading_set_prompt("Sunday 4 October 2026", "French");
        assert!(prompt.contains("For Sunday 4 October 2026,"));
        assert!(prompt.contains("in French"));
        assert!(prompt.contains("green, red, white, purple, rose"));
    }

    #[test]
    fn test_reflection_prompt_carries_gospel() {
        let prompt = reflection_prompt("  Blessed are the poor in spirit.\n", "English");
        assert!(prompt.contains("about 150 words"));
        assert!(prompt.ends_with("\n\nBlessed are the poor in spirit."));
    }

    #[test]
    fn test_schema_shape() {
        let schema = reading_set_schema();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(
            schema["required"],
            json!(["date", "liturgicalColor", "liturgicalDayName", "gospel"])
        );
        assert_eq!(
            schema["properties"]["liturgicalColor"]["enum"],
            json!(["green", "red", "white", "purple", "rose"])
        );
        assert_eq!(schema["properties"]["gospel"]["properties"]["text"]["type"], "STRING");
        assert!(schema["properties"]["psalm"]["properties"]["text"].get("description").is_none());
    }
}
