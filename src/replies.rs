//! Outbound Replies
//!
//! Every natural-language message the bot sends, parameterised by the
//! user's display name. Kept apart from the state machine so handlers
//! read as control flow.

use rand::seq::SliceRandom;

pub const TERMS_URL: &str =
    "https://drive.google.com/file/d/1x7fp9FO3vRGaRcpEeJTbVa050B5aordr/view?usp=sharing";

pub const SECURITY_TIPS: [&str; 10] = [
    "🛡️ Usa contraseñas únicas y fuertes para cada una de tus cuentas importantes. ¡Un gestor de contraseñas puede ayudarte mucho!",
    "🔒 Activa la verificación en dos pasos (2FA) siempre que esté disponible, especialmente en tu correo, redes sociales y bancos.",
    "❓ Desconfía de mensajes inesperados que te pidan información personal o te urjan a hacer clic en enlaces, ¡incluso si parecen de contactos conocidos!",
    "🔗 Antes de hacer clic en un enlace, especialmente en correos o mensajes, verifica que la dirección web (URL) sea legítima y no una imitación.",
    "🔄 Mantén tu sistema operativo, navegador y antivirus siempre actualizados para protegerte de las últimas amenazas.",
    "🚫 No descargues archivos de fuentes desconocidas o correos sospechosos, podrían contener malware.",
    "👀 Revisa periódicamente los permisos de las aplicaciones en tu teléfono y redes sociales. ¡Quita los que no necesites!",
    "💸 Sé muy cuidadoso con ofertas que parecen demasiado buenas para ser verdad, ¡usualmente lo son y pueden ser una estafa!",
    "📞 Si recibes una llamada o mensaje sospechoso de tu banco o una entidad, cuelga y contáctalos directamente a través de sus canales oficiales.",
    "📶 Evita conectarte a redes Wi-Fi públicas no seguras para realizar transacciones bancarias o ingresar información sensible.",
];

/// One tip chosen at random
pub fn random_tip() -> &'static str {
    SECURITY_TIPS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(SECURITY_TIPS[0])
}

// ============================================================================
// First contact & onboarding
// ============================================================================

pub fn welcome_terms() -> String {
    format!(
        "👋 ¡Hola! Soy SecurityBot-WA, tu asistente virtual para ayudarte a navegar seguro en el mundo digital en Colombia. 😊\n\n\
         Para darte la mejor orientación y cumplir con la Ley 1581 de 2012 (protección de datos personales), necesito tu autorización para guardar algunos datos como tu número de teléfono, y más adelante, tu nombre, edad y nivel de conocimiento en ciberseguridad.\n\n\
         🔒 Tu información será confidencial y se usará exclusivamente para mejorar tu experiencia. ¡Nunca la compartiré con terceros!\n\n\
         📄 Puedes conocer más detalles en nuestros Términos y Política de Privacidad: {TERMS_URL}\n\n\
         👉 Si estás de acuerdo, por favor responde con: ACEPTO"
    )
}

pub fn terms_accepted() -> String {
    "¡Excelente! 😊 Gracias por aceptar. Para que mis consejos sean aún mejores para ti, ¿podrías decirme tu nombre, por favor?".to_string()
}

pub fn terms_rejected() -> String {
    "Entendido. Si cambias de opinión y deseas aceptar los términos para usar mis servicios, solo escribe *ACEPTO*. ¡Estaré aquí para ayudarte! 👍".to_string()
}

pub fn terms_reprompt() -> String {
    "⚠️ Para que podamos continuar, necesito que aceptes los términos. Solo escribe *ACEPTO* si estás de acuerdo. Si no deseas continuar, puedes responder *NO ACEPTO*. ¡Gracias! 👍".to_string()
}

pub fn ask_age(name: &str) -> String {
    format!("¡Un placer conocerte, {name}! 👋 Ahora, si no es molestia, ¿me dirías cuántos años tienes? (Solo el número, por ejemplo: 35). Esto me ayuda a darte consejos más adecuados.")
}

pub fn name_invalid() -> String {
    "🤔 Mmm, eso no me parece un nombre de persona. ¿Podrías intentarlo de nuevo, por favor? Solo necesito tu primer nombre o cómo te gustaría que te llame. ¡Gracias!".to_string()
}

pub fn name_unclear() -> String {
    "🤔 No estoy seguro de haber entendido tu nombre. ¿Podrías escribirlo de nuevo, un poquito más claro, por favor? ¡Gracias!".to_string()
}

pub fn ask_knowledge(name: &str) -> String {
    format!("¡Perfecto, {name}! 👍 Ya casi terminamos. Cuéntame, ¿qué tanto sabes sobre ciberseguridad y estafas en línea? Puedes responder: *Sí* (si sabes bastante), *Poco*, o *No* (si no sabes mucho). ¡Tu honestidad me ayuda a ayudarte mejor! 😊")
}

pub fn age_out_of_range(name: &str, age: i64) -> String {
    format!("⚠️ Entendí el número {age}, pero parece una edad un poco inusual, {name}. ¿Podrías confirmarla o escribirla de nuevo solo con números (por ejemplo: 28, 65)? ¡Gracias!")
}

pub fn age_invalid(name: &str) -> String {
    format!("🤔 {name}, eso no me parece una edad. ¿Podrías decirme cuántos años tienes usando números, por ejemplo '55'? ¡Gracias!")
}

pub fn age_unclear(name: &str) -> String {
    format!("🤔 No estoy seguro de haber entendido tu edad, {name}. Para que pueda ayudarte mejor, ¿podrías escribirla solo con números, por ejemplo '70'? ¡Gracias por tu paciencia!")
}

pub fn registration_complete(name: &str) -> String {
    format!(
        "¡Genial, {name}! ✅ ¡Hemos completado tu registro! Muchas gracias por tu tiempo y confianza. 🙏\n\n\
         🛡️ A partir de ahora, estoy a tu disposición. Puedes enviarme cualquier mensaje de texto o imagen que te parezca sospechosa, y la analizaré contigo. También puedes hacerme preguntas sobre seguridad digital y cómo protegerte de fraudes en línea, o pedirme un consejo de seguridad.\n\n\
         ¡Estoy aquí para ayudarte a navegar el mundo digital de forma más segura! 😊"
    )
}

pub fn knowledge_unclear(name: &str) -> String {
    format!("⚠️ Ups, {name}. No entendí bien tu respuesta sobre tu conocimiento. Para que pueda ayudarte mejor, ¿podrías decirme si sabes *Sí*, *Poco*, o *No* sobre ciberseguridad? ¡Una de esas tres opciones me ayuda mucho! 👍")
}

pub fn onboarding_empty(name: &str) -> String {
    format!("Hola {name}, parece que no escribiste nada. Por favor, envía una respuesta para que podamos continuar. 😊")
}

pub fn onboarding_needs_text(name: &str) -> String {
    format!("¡Hola, {name}! 😊 Para que podamos configurar tu perfil, necesito que me respondas con mensajes de texto a las preguntas anteriores. ¡Gracias!")
}

// ============================================================================
// Reset & feedback
// ============================================================================

pub fn reset_done(name: &str) -> String {
    format!("De acuerdo, {name}. Hemos cancelado la operación actual y volvemos al inicio. ¿En qué te puedo ayudar? 😊")
}

pub fn reset_to_menu(name: &str) -> String {
    format!("De acuerdo, {name}. Hemos vuelto al menú principal. ¿En qué te puedo ayudar ahora? 😊")
}

pub fn feedback_thanks() -> String {
    "¡Gracias por tu feedback! 😊".to_string()
}

// ============================================================================
// Registered-user dispatcher
// ============================================================================

pub fn registered_empty(name: &str) -> String {
    format!("🤔 {name}, parece que me enviaste un mensaje vacío. ¿Necesitas ayuda con algo? Puedes enviarme un mensaje que te parezca sospechoso o hacerme una pregunta sobre seguridad. 👍")
}

/// Recent-activity note appended to a greeting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecentActivity {
    ImageAnalysis,
    LinkAnalysis,
    Nothing,
}

pub fn greeting(name: &str, recent: RecentActivity) -> String {
    let note = match recent {
        RecentActivity::ImageAnalysis => " La última vez que interactuamos fue sobre el análisis de una imagen.",
        RecentActivity::LinkAnalysis => " Recientemente analizamos un enlace.",
        RecentActivity::Nothing => "",
    };
    format!("¡Hola de nuevo, {name}! 👋{note} ¿En qué te puedo ayudar hoy? 😊")
}

pub fn meta_images(name: &str) -> String {
    format!("¡Claro que sí, {name}! Puedes enviarme imágenes que te parezcan sospechosas y las analizaré para ti. 🖼️👍")
}

pub fn meta_capabilities(name: &str) -> String {
    format!("Soy SecurityBot-WA, {name}. Estoy aquí para ayudarte a analizar mensajes de texto o imágenes que te parezcan sospechosas de ser estafas o phishing. También puedo responder tus preguntas sobre ciberseguridad y cómo protegerte en línea, o darte consejos de seguridad. 😊")
}

pub fn meta_audio(name: &str) -> String {
    format!("¡Hola, {name}! Por el momento, mi especialidad son los mensajes de texto e imágenes. Aún estoy aprendiendo a procesar audios, ¡pero espero poder ayudarte con ellos muy pronto! 😊")
}

pub fn meta_general(name: &str) -> String {
    format!("Entendido, {name}. Si tienes un mensaje o imagen para analizar, ¡envíamelo! O si tienes una pregunta sobre ciberseguridad o quieres un consejo, también puedo ayudarte con eso. 😊")
}

pub fn security_question_ack(name: &str) -> String {
    format!("🤔 ¡Buena pregunta sobre seguridad, {name}! Déjame consultar mis datos para darte la mejor respuesta. Un momento, por favor... 💡")
}

pub fn security_question_failed(name: &str) -> String {
    format!("Mis disculpas, {name}. Parece que tuve un inconveniente al procesar tu pregunta de seguridad. ¿Podrías intentar reformularla o consultarme de nuevo en un momento? Gracias por tu paciencia. 😊")
}

pub fn security_question_closing(name: &str) -> String {
    format!("Espero que esta información te sea útil, {name}. 👍")
}

pub fn tip(name: &str, tip: &str) -> String {
    format!("¡Claro, {name}! Aquí tienes un consejo de seguridad para ti:\n\n{tip}\n\nEspero te sea útil. 😊")
}

pub fn capabilities_menu(name: &str) -> String {
    format!(
        "Vaya, {name}, no estoy completamente seguro de cómo ayudarte con eso. 🤔\n\
         Recuerda que puedo:\n\
         1. Analizar un mensaje o imagen sospechosa 🔍\n\
         2. Responder preguntas sobre ciberseguridad 🛡️\n\
         3. Darte un consejo de seguridad rápido 💡\n\n\
         ¿Qué te gustaría hacer? Puedes enviar el mensaje/imagen a analizar, tu pregunta, o escribir 'consejo'."
    )
}

pub fn audio_not_supported(name: &str) -> String {
    format!("¡Hola, {name}! Recibí tu mensaje de audio. 🎤 Aún estoy aprendiendo a procesarlos, ¡pero espero poder ayudarte con ellos muy pronto! 😊")
}

pub fn unsupported_type(name: &str, kind: &str) -> String {
    format!("Recibí un tipo de mensaje ({kind}) que aún no sé cómo procesar del todo, {name}. Por ahora, mi especialidad son los mensajes de texto e imágenes. 📄🖼️")
}

pub fn memory_glitch(name: &str) -> String {
    format!("¡Hola {name}! Parece que hubo un pequeño error con mi memoria. ¿Podrías intentar enviarme tu mensaje de nuevo? Gracias. 😊")
}

// ============================================================================
// Images
// ============================================================================

pub fn image_received(name: &str) -> String {
    format!("🖼️ ¡Recibí tu imagen, {name}! La voy a revisar con cuidado y te envío mi análisis en un momento. 🧐")
}

pub fn image_missing_reference(name: &str) -> String {
    format!("⚠️ Vaya, {name}, parece que hubo un problema con la imagen que enviaste. ¿Podrías intentar mandarla de nuevo, por favor?")
}

pub fn image_download_failed(name: &str) -> String {
    format!("⚠️ Lo siento, {name}, no pude descargar la imagen que enviaste. ¿Podrías intentar enviarla de nuevo o verificar que sea válida? Por favor.")
}

pub fn image_no_text(name: &str) -> String {
    format!("🤔 {name}, no pude encontrar texto legible en la imagen. Para que pueda ayudarte mejor, asegúrate de que la imagen sea clara y el texto no sea muy pequeño o esté borroso. ¡Gracias!")
}

pub fn ocr_unavailable(name: &str) -> String {
    format!("⚠️ ¡Uy, {name}! Parece que tengo un problema técnico con mi sistema para leer imágenes en este momento. Lamento no poder analizarla esta vez. Puedes intentarlo más tarde o enviarme el texto directamente si es posible.")
}

pub fn image_unexpected_error(name: &str) -> String {
    format!("⚠️ Lo siento mucho, {name}, ocurrió un error inesperado mientras procesaba tu imagen. Ya estoy enterado del problema. Por favor, intenta más tarde. 🙏")
}

/// Wraps OCR output so the analysis knows it may contain recognition errors
pub fn ocr_provenance_note(name: &str, ocr_text: &str) -> String {
    format!("(El siguiente texto fue extraído de una imagen que me envió {name}. El OCR podría tener errores, por favor intenta entender el contexto original):\n---\n{ocr_text}\n---")
}

// ============================================================================
// Analysis reveal flow
// ============================================================================

pub fn analysis_ack(name: &str) -> String {
    format!("🔍 ¡Entendido, {name}! Estoy revisando el mensaje que me enviaste. Te aviso en un momento con mi análisis... 👍")
}

pub fn analysis_failed(name: &str) -> String {
    format!("Lo siento mucho, {name}, tuve un problema al intentar analizar tu mensaje. ¿Podrías intentarlo de nuevo un poco más tarde, por favor? 🙏")
}

pub fn ask_for_details(name: &str) -> String {
    format!("{name}, ¿quieres que te dé más detalles y mis recomendaciones sobre esto? 😊")
}

pub fn ask_feedback(name: &str) -> String {
    format!("{name}, ¿te fue útil este análisis? Puedes responder con un 👍 o 👎, o simplemente seguir con otra consulta.")
}

pub fn details_missing() -> String {
    "Parece que no tengo los detalles guardados. Por favor, envía el mensaje original de nuevo para analizarlo.".to_string()
}

pub fn details_choice_unclear(name: &str) -> String {
    format!("🤔 {name}, no estoy seguro de cómo proceder. Si querías ver los detalles, puedes intentarlo de nuevo diciendo 'sí, quiero verlos'. Si era otra consulta, por favor envíamela de nuevo.")
}

pub fn details_needs_text(name: &str) -> String {
    format!("Hola {name}, esperaba un mensaje de texto para saber si querías más detalles. Si es así, por favor, escribe algo como 'sí, muéstrame'. Si era otra cosa, puedes enviármelo.")
}

// ============================================================================
// Incident sub-dialogue
// ============================================================================

pub fn incident_yes_ack(name: &str) -> String {
    format!("🆘 Entendido, {name}. No te preocupes, vamos a ver qué pasos puedes seguir. Dame un momento para prepararte la información... 🛡️")
}

pub fn incident_help_ack(name: &str) -> String {
    format!("🆘 De acuerdo, {name}. Te prepararé los pasos de ayuda específicos. Un momento, por favor... 🛡️")
}

pub fn help_steps_failed(name: &str) -> String {
    format!("Lo lamento, {name}, tuve dificultades para generar los pasos de ayuda en este momento. Si es urgente, te recomiendo contactar directamente a tu banco, a las autoridades (CAI Virtual de la Policía Nacional) o a un experto en seguridad. 🙏")
}

pub fn incident_no(name: &str) -> String {
    format!("¡Excelente noticia, {name}! 👍 Me alegra mucho que no hayas interactuado con ese mensaje sospechoso. ¡Eso demuestra que estás muy alerta! Sigue así, desconfiando y verificando siempre. Si tienes algo más que quieras analizar o alguna otra pregunta, no dudes en decírmelo. 😊")
}

pub fn incident_question_ack(name: &str, question_excerpt: &str) -> String {
    format!("🤔 ¡Claro, {name}! Déjame responder tu pregunta sobre \"{question_excerpt}...\". Un momento...")
}

pub fn incident_question_failed(name: &str) -> String {
    format!("Mis disculpas, {name}, no pude procesar tu pregunta en este momento. {}", incident_reprompt_after_digression(name))
}

pub fn incident_reprompt_after_digression(name: &str) -> String {
    format!("Espero que eso haya aclarado tu duda, {name}. Recordando nuestra conversación anterior sobre el mensaje sospechoso, ¿llegaste a interactuar con él (SÍ/NO) o necesitas AYUDA específica?")
}

fn incident_reprompt_after_comment(name: &str) -> String {
    format!("Entendido, {name}. Volviendo al tema importante: sobre el mensaje que analizamos, ¿llegaste a interactuar con él (SÍ/NO) o necesitas AYUDA específica?")
}

pub fn incident_comment_thanks(name: &str) -> String {
    format!("¡De nada, {name}! 😊 {}", incident_reprompt_after_comment(name))
}

pub fn incident_comment_ack(name: &str) -> String {
    format!("Entendido, {name}. {}", incident_reprompt_after_comment(name))
}

pub fn incident_comment_other(name: &str) -> String {
    format!("Ok, {name}, he tomado nota de tu comentario. {}", incident_reprompt_after_comment(name))
}

pub fn incident_reprompt(name: &str) -> String {
    format!("🤔 {name}, no estoy seguro de haber entendido tu respuesta. A mi pregunta anterior sobre si interactuaste con el mensaje, por favor responde con *SÍ*, *NO*, o escribe *AYUDA* si necesitas los pasos a seguir. ¡Gracias!")
}

pub fn incident_empty(name: &str) -> String {
    format!("Por favor, {name}, responde SÍ, NO o AYUDA a mi pregunta anterior. ¡Gracias! 😊")
}

pub fn incident_needs_text(name: &str) -> String {
    format!("Hola {name}, estaba esperando una respuesta de SÍ, NO o AYUDA en texto. Si quieres analizar otra cosa, envíala después de responder, por favor. 👍")
}
