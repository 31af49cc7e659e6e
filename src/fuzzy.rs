use crate::normalize::space_form;
use crate::schema::SymptomMapping;
use tracing::debug;

/// Fallback disease scoring for when no trained model artifact exists.
///
/// Both sides are compared in space-separated form, and a hit is
/// bidirectional substring containment. Each hit adds 1 to every disease
/// listed under the matching key. Ties resolve to the disease first
/// encountered in mapping insertion order, which the mapping guarantees
/// matches the file's key order. No hits at all is a legitimate "no
/// match" outcome, not an error.
pub fn match_disease(symptoms: &[String], mapping: &SymptomMapping) -> Option<String> {
    let mut scores: Vec<(String, u32)> = Vec::new();

    for symptom in symptoms {
        let symptom_form = space_form(symptom);
        // An empty token substring-matches every key
        if symptom_form.trim().is_empty() {
            continue;
        }
        for (key, diseases) in mapping.iter() {
            let key_form = space_form(key);
            if symptom_form.contains(&key_form) || key_form.contains(&symptom_form) {
                for disease in diseases {
                    bump(&mut scores, disease);
                }
            }
        }
    }

    let winner = scores
        .iter()
        .fold(None::<&(String, u32)>, |best, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        })
        .map(|(disease, score)| {
            debug!("Fallback match: {} (score {})", disease, score);
            disease.clone()
        });

    winner
}

fn bump(scores: &mut Vec<(String, u32)>, disease: &str) {
    match scores.iter_mut().find(|(d, _)| d == disease) {
        Some((_, score)) => *score += 1,
        None => scores.push((disease.to_string(), 1)),
    }
}
