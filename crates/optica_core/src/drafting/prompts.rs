//! Prompt text sent to the drafting model.

use super::{DraftRequest, Tone, BUSINESS_NAME};

fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Formal => "Formal y profesional",
        Tone::Friendly => "Amable y cercano",
    }
}

/// Instructions for a short WhatsApp message addressed to one patient.
pub fn make_message_prompt(request: &DraftRequest) -> String {
    format!(
        r#"Actúa como un asistente administrativo de "{BUSINESS_NAME}".
Redacta un mensaje corto para WhatsApp dirigido al paciente "{name}".

Contexto del mensaje: {context}
Tono: {tone}.
Idioma: Español.

Reglas:
1. No uses saludos genéricos como "Estimado cliente", usa su nombre.
2. Sé breve y conciso.
3. Incluye emojis sutiles si el tono es amable.
4. No inventes precios ni fechas que no estén en el contexto.
5. Solo devuelve el texto del mensaje, nada más."#,
        name = request.patient_name,
        context = request.context,
        tone = tone_label(request.tone),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_name_context_and_tone() {
        let prompt = make_message_prompt(&DraftRequest::new(
            "Luis",
            "cita de control el lunes",
            Tone::Formal,
        ));
        assert!(prompt.contains("\"Luis\""));
        assert!(prompt.contains("Contexto del mensaje: cita de control el lunes"));
        assert!(prompt.contains("Tono: Formal y profesional."));
    }
}
