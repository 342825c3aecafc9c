use styleaudit_contracts::fonts::FontInfoMap;

pub const GENERIC_FONT_GUIDANCE: &str = "\
**Note**: font information could not be retrieved from the Figma API.
Use the following common font conventions as a reference:

- Japanese text: Noto Sans JP (common Japanese typeface)
- Latin letters and digits: Poppins (common Latin typeface)
- Headings: 24px, 20px, 16px (common heading sizes)
- Body: 14px, 16px (common body sizes)
- Button text: 14px, 16px (common button sizes)";

pub fn guideline_system_instruction() -> &'static str {
    "You are a design analysis assistant. Read the concrete purpose and meaning of every rule in the guideline, classify each under a clear descriptive name, and always answer in JSON."
}

pub fn guideline_instruction() -> &'static str {
    r##"You are a design checking assistant.
Extract the color and font rules from the attached guideline image in detail and output them in the following JSON format.

**Important**: read the concrete usage and meaning of each rule from the guideline and classify it under an easy-to-understand name.

```json
{
  "colors": {
    "textColor": "#text color",
    "buttonTextColor": "#button text color",
    "textBoxColor": "#text box color",
    "backgroundColor1": "#background color 1",
    "backgroundColor2": "#background color 2",
    "footerBackgroundColor": "#footer background color"
  },
  "fonts": {
    "japaneseFont": "Japanese font name",
    "englishFont": "Latin letters and digits font name"
  },
  "fontSizes": {
    "h1": "h1 font size",
    "h2": "h2 font size",
    "h3": "h3 font size",
    "body": "body font size"
  }
}
```

**Extraction points:**
- Group colors by usage (text, buttons, backgrounds, footer, ...)
- Group fonts by language (Japanese, Latin letters and digits)
- Group font sizes by heading level
- Reflect the concrete usage and meaning stated in the guideline
- Always answer with a JSON block"##
}

pub fn design_system_instruction() -> &'static str {
    "You are a design analysis assistant. Always answer in JSON."
}

/// FontInfoMap rendering, or generic conventions when Figma gave nothing.
pub fn font_hint(fonts: &FontInfoMap) -> String {
    if fonts.is_empty() {
        return GENERIC_FONT_GUIDANCE.to_string();
    }
    fonts.render_hint()
}

pub fn design_instruction(font_hint: &str) -> String {
    format!(
        r##"Extract the elements of every section of the attached design mock-up and output them in the following JSON format.

**Important**: use the font information below, retrieved from the Figma API, to set accurate fontSize and fontFamily values.

### Font information from the Figma API:
{font_hint}

### Output format:
```json
{{
  "sections": [
    {{
      "name": "section name",
      "elements": [
        {{
          "type": "element type",
          "content": "text content",
          "fontFamily": "concrete font name (e.g. Noto Sans JP, Poppins)",
          "fontSize": "concrete number (e.g. 24, 20, 16, 14)",
          "color": "#color code"
        }}
      ]
    }}
  ]
}}
```

**Notes:**
- Always give concrete fontSize and fontFamily values (placeholders and "unknown" are not allowed)
- When an element's text matches the Figma information above, use that fontSize and fontFamily
- When the text does not match exactly, infer with these rules:
  - Japanese text -> Noto Sans JP
  - Latin letters and digits -> Poppins
  - Headings -> 24px, 20px, 16px
  - Body -> 14px, 16px
  - Button text -> 14px, 16px
- Always answer with a JSON block"##
    )
}

pub fn compare_system_instruction() -> &'static str {
    "You are a strict design audit assistant."
}

pub fn compare_instruction(guideline: &str, design_json: &str) -> String {
    format!(
        r##"Below are the JSON extracted from a design guideline and the JSON extracted from a design mock-up.
Compare them and output a **Markdown** report in the following format.

## Guideline
```json
{guideline}
```

## Design mock-up (with Figma API information)
```json
{design_json}
```

### Output format:
```markdown
### 1. Extracted from the guideline

#### Colors
- Text color: [color code]
- Button text color: [color code]
- Text box: [color code]
- Background color 1: [color code]
- Background color 2: [color code]
- Footer background color: [color code]

#### Fonts
- Japanese font: **[font name]**
- Latin font: **[font name]**
- h1 font size: [size]px
- h2 font size: [size]px
- h3 font size: [size]px

---

### 2. Extracted from the design

#### Section: [section name]
- elements:
  - type: [element type]
    content: [text content]
    fontFamily: [font name]
    fontSize: [font size]
    color: [color code]
  [other elements likewise]

---

### 3. Differences

| Element type | Design element | Guideline | Difference |
|--------------|----------------|-----------|------------|
| [element type] | [design element] | [guideline] | [difference] |

[overall assessment and improvement suggestions]
```

**Check points:**
- Do the colors follow the guideline?
- Do the font families follow the guideline?
- Do the font sizes follow the guideline?
- Is the design consistent overall?

Always use the format above and show the differences clearly as a table."##
    )
}

#[cfg(test)]
mod tests {
    use styleaudit_contracts::fonts::{FontInfoMap, TextStyle};

    use super::{compare_instruction, design_instruction, font_hint, GENERIC_FONT_GUIDANCE};

    #[test]
    fn empty_font_map_falls_back_to_generic_guidance() {
        assert_eq!(font_hint(&FontInfoMap::new()), GENERIC_FONT_GUIDANCE);
    }

    #[test]
    fn design_instruction_embeds_figma_styles() {
        let mut fonts = FontInfoMap::new();
        fonts.insert("お問い合わせ", TextStyle::new(16, "Noto Sans JP"));
        let prompt = design_instruction(&font_hint(&fonts));

        assert!(prompt.contains("- text: 'お問い合わせ' -> font size: 16, font family: Noto Sans JP"));
        assert!(prompt.contains("\"sections\": ["));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn compare_instruction_embeds_both_documents_verbatim() {
        let guideline = "{\"colors\": {}, \"fonts\": {}, \"fontSizes\": {}}";
        let design = "{\n  \"sections\": []\n}";
        let prompt = compare_instruction(guideline, design);

        assert!(prompt.contains(guideline));
        assert!(prompt.contains(design));
        assert!(prompt.contains("| Element type | Design element | Guideline | Difference |"));
    }
}
