//! Prompt constants for illustrations.
//!
//! Every image call of a book receives the identical `ART_STYLE_PROMPT` preamble;
//! that is what keeps Pepito and Pepón recognisable from page to page.

/// Shared style and character sheet, prepended verbatim to every scene.
pub const ART_STYLE_PROMPT: &str = "\
**Art Style:** A high-quality digital painting in the style of a classic children's book with a gentle, \
pictorial, and artisanal watercolor finish. The lighting must be warm and soft, creating a cozy and \
nostalgic atmosphere. All images must be in a 4:3 landscape aspect ratio.\n\
\n\
**Character Descriptions (Mandatory):**\n\
*   **Pepito:** A 3-year-old boy, small in stature, with messy dark brown hair, big brown eyes, and rosy \
cheeks. He is always wearing the exact same outfit: a sweater with horizontal red and orange stripes, and \
blue shorts. He has fair skin.\n\
*   **Pepón:** A 5-year-old boy, taller and sturdier than his brother, with neat dark brown hair. He is \
always wearing the exact same outfit: a blue and yellow polo shirt (remera tipo chomba) and dark long \
pants. He has the same fair skin as his brother.\n\
\n\
**Consistency Rule:** Pepito and Pepón must look identical in every single image, with the exact same \
face, hair, and clothing as described.";

/// Scene 0 of every book.
pub const COVER_SCENE_PROMPT: &str = "A beautiful and attractive cover scene with the two protagonists, \
Pepito and Pepón, in a pleasant and safe natural landscape like a sunny meadow or a gentle forest. No text.";

/// Separates the style preamble from the scene description.
pub const SCENE_LABEL: &str = "**Scene:** ";

/// Full prompt for one image call: `<style>\n\n**Scene:** <scene>`.
pub fn build_scene_prompt(style: &str, scene: &str) -> String {
    format!("{style}\n\n{SCENE_LABEL}{scene}")
}
