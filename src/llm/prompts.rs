//! French prompt builders for the two decision oracles. Both embed the data
//! under analysis as JSON and pin the response down to a strict JSON object,
//! no prose, no markdown fences.

use crate::llm::types::{ConformityResponse, PrefixResponse};
use crate::schema::{Block, FieldMap};

const PREFIX_RULES: &str = r#"Tu es un assistant chargé d'analyser un bloc issu d'un document de spécifications.

Le bloc contient :
- un paragraphe d'introduction (`context_paragraph`) décrivant le contexte du tableau,
- un tableau structuré (`table_data`) avec des colonnes telles que "champ", "format attendu", "contraintes supplémentaires",
- un identifiant de bloc (`block_index`).

Ton objectif : détecter le **préfixe attendu** de ce bloc.
UN PRÉFIXE EXISTE TOUJOURS, MÊME S'IL EST IMPLICITE.

Un préfixe est une suite de lettres ou de chiffres (souvent 2 à 5 caractères) qui ouvre chaque identifiant régi par ce bloc. Il peut être :
- mentionné explicitement ("Le préfixe attendu est ABC", "Chaque identifiant commence par AZE"),
- déduit d'un format ("CBE + 8 chiffres" implique "CBE" ; "023 + 15 chiffres" implique "023"),
- déduit d'un motif répété dans les valeurs du tableau.

Tu ne dois JAMAIS répondre null : déduis toujours le préfixe le plus probable à partir des indices visibles.

Exemples valides de préfixes : CBE, AZE, 032, CLT001, PRD.

Réponds UNIQUEMENT avec un objet JSON valide, sans texte avant ou après, sans balises Markdown, contenant exactement les clés `block_index` et `prefixe_detecte`."#;

/// Prompt for the prefix oracle: rules, the JSON schema of the expected
/// answer, then the block itself.
pub fn build_prefix_prompt(block: &Block) -> String {
    let schema = schemars::schema_for!(PrefixResponse);
    format!(
        "{rules}\n\n\
         Schéma JSON de la réponse attendue :\n{schema}\n\n\
         Voici le bloc à analyser :\n{block}",
        rules = PREFIX_RULES,
        schema = serde_json::to_string_pretty(&schema).unwrap_or_default(),
        block = serde_json::to_string_pretty(block).unwrap_or_default(),
    )
}

const CONFORMITY_RULES: &str = r#"Tu es un assistant rigoureux chargé de vérifier la conformité d'une ligne issue d'un fichier de transactions PCR avec les spécifications fournies.

Ta mission :
1. Vérifier que tous les champs listés dans les spécifications sont présents dans la ligne.
2. Pour chaque champ, contrôler que la valeur extraite respecte strictement les spécifications (type, longueur, préfixe, contraintes).
3. Vérifier que l'ordre des champs dans la ligne correspond exactement à l'ordre défini dans les spécifications.
4. Si l'ordre est incorrect, proposer l'ordre corrigé sous forme d'une liste ordonnée des noms de champs.
5. Proposer une ligne corrigée qui respecte à la fois l'ordre, les longueurs et les contraintes.

Ta réponse doit être strictement un objet JSON, sans texte ni explication supplémentaire, avec exactement ces clés :
- "line" : la ligne PCR analysée (chaîne),
- "conforme" : booléen, conformité globale de la ligne,
- "champs" : une liste d'objets, un par champ, avec "nom", "valeur", "conforme" (booléen), "erreur" (chaîne ou null si conforme), "longueur_attendue" (entier),
- "ordre_champs" : objet avec "conforme" (booléen), "ordre_attendu" (liste de noms), "ordre_lu" (liste de noms) et, UNIQUEMENT quand l'ordre est incorrect, "suggestion_ordre_corrige" (liste de noms dans le bon ordre),
- "ligne_corrigee" : chaîne, la ligne PCR corrigée.

Règle impérative sur "ordre_champs" : ne JAMAIS inclure "suggestion_ordre_corrige" quand "conforme" vaut true ; l'inclure obligatoirement quand "conforme" vaut false."#;

/// Prompt for the conformity oracle: rules, answer schema, then the literal
/// line and the matched block's field specifications.
pub fn build_conformity_prompt(line: &str, table_data: &[FieldMap]) -> String {
    let schema = schemars::schema_for!(ConformityResponse);
    format!(
        "{rules}\n\n\
         Schéma JSON de la réponse attendue :\n{schema}\n\n\
         Ligne PCR à analyser :\n\"{line}\"\n\n\
         Spécifications du bloc associé :\n{specs}",
        rules = CONFORMITY_RULES,
        schema = serde_json::to_string_pretty(&schema).unwrap_or_default(),
        line = line,
        specs = serde_json::to_string_pretty(table_data).unwrap_or_default(),
    )
}

/// Strips markdown fences or stray prose around the JSON object a model was
/// asked to return, keeping the outermost `{...}` span.
pub fn clean_json_output(raw: &str) -> &str {
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            return &raw[start..=end];
        }
    }
    raw.trim()
}
