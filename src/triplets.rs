/// Splits a raw classification cell into component groups.
///
/// The cell format joins triplet groups with `~` and a group's components
/// with `;`, optionally wrapped in quotes:
/// `"HUMAN SOCIETY;ANZSRC FoR;https://.../44~EDUCATION;ANZSRC FoR;https://.../39"`.
///
/// Embedded `"` characters are stripped and every component is trimmed.
/// Component counts are not checked here; groups that are not valid
/// triplets are dropped later when the payload is built.
pub fn parse_triplets(raw: &str) -> Vec<Vec<String>> {
    let cleaned = raw.replace('"', "");
    cleaned
        .split('~')
        .map(|group| {
            group
                .split(';')
                .map(|component| component.trim().to_string())
                .collect()
        })
        .collect()
}
