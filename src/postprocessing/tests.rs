use super::*;
use crate::memory::{Importance, MistakeRecord};

#[test]
fn clean_works() {
    let raw = "```\nhola\n```";
    assert_eq!(clean(raw), "hola");
}

#[test]
fn model_written_corrections_are_removed() {
    let reply = "¡Claro! ¿Qué desea beber?\n[Correction: yo quiero un mesa → yo quiero una mesa]\n";
    assert_eq!(strip_corrections(reply), "¡Claro! ¿Qué desea beber?");
    assert!(!is_correction_line("[Nota: algo]"));
}

#[test]
fn annotate_appends_one_line_per_mistake() {
    let a = MistakeRecord::new("yo es", "yo soy", "grammar", Importance::CRITICAL);
    let b = MistakeRecord::new("un mesa", "una mesa", "gender", Importance::NOTABLE);

    let annotated = annotate("¡Bienvenido!", &[&a, &b]);
    assert_eq!(
        annotated,
        "¡Bienvenido!\n\n[Correction: yo es → yo soy]\n[Correction: un mesa → una mesa]"
    );
}

#[test]
fn annotate_without_mistakes_is_identity() {
    assert_eq!(annotate("Hola", &[]), "Hola");
}

#[test]
fn annotate_empty_reply() {
    let a = MistakeRecord::new("yo es", "yo soy", "grammar", Importance::CRITICAL);
    assert_eq!(annotate("", &[&a]), "[Correction: yo es → yo soy]");
}
