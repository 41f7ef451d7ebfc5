//! Collaborator UI sections.
//!
//! Each section owns its own records for the lifetime of the session.
//! The reactor never looks inside; it only receives a [`SectionReport`]
//! (response text plus an optional section switch) for each handled action.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::state::SectionId;

/// A user action performed in one of the sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionAction {
    Open(SectionId),
    SendMessage { recipient: String, text: String },
    AddReminder { text: String },
    RequestMedication { name: String, dosage: String, frequency: String },
    ScheduleAppointment { doctor: String, date: String, time: String },
    CallContact { name: String },
    CallEmergency,
    FindNearbyHospitals,
}

/// What the reactor applies after a section handled an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    pub section: Option<SectionId>,
    pub response: String,
}

impl SectionReport {
    fn say(response: impl Into<String>) -> Self {
        Self {
            section: None,
            response: response.into(),
        }
    }

    fn navigate(section: SectionId, response: impl Into<String>) -> Self {
        Self {
            section: Some(section),
            response: response.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub recipient: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRequest {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub requested_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor: String,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hospital {
    pub name: String,
    pub address: String,
    pub distance: String,
    pub phone: String,
}

/// Placeholder directory until real geolocation exists.
fn simulated_hospitals() -> Vec<Hospital> {
    [
        ("Hospital Central", "Calle Principal 123", "2.5 km", "555-1234"),
        ("Clínica del Valle", "Avenida Siempre Viva 45", "4.1 km", "555-5678"),
        ("Centro Médico San Juan", "Plaza Mayor s/n", "7.8 km", "555-9012"),
    ]
    .into_iter()
    .map(|(name, address, distance, phone)| Hospital {
        name: name.to_string(),
        address: address.to_string(),
        distance: distance.to_string(),
        phone: phone.to_string(),
    })
    .collect()
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[derive(Debug, Clone)]
pub struct SectionBoard {
    messages: Vec<Message>,
    reminders: Vec<Reminder>,
    medication_requests: Vec<MedicationRequest>,
    appointments: Vec<Appointment>,
    hospitals: Vec<Hospital>,
}

impl Default for SectionBoard {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            reminders: Vec::new(),
            medication_requests: Vec::new(),
            appointments: Vec::new(),
            hospitals: simulated_hospitals(),
        }
    }
}

impl SectionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn medication_requests(&self) -> &[MedicationRequest] {
        &self.medication_requests
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    pub fn apply(&mut self, action: SectionAction, today: NaiveDate) -> SectionReport {
        match action {
            SectionAction::Open(section) => SectionReport::navigate(section, open_text(section)),
            SectionAction::SendMessage { recipient, text } => {
                if blank(&recipient) || blank(&text) {
                    return SectionReport::say("Por favor, ingresa el destinatario y el mensaje.");
                }
                self.messages.push(Message {
                    recipient: recipient.trim().to_string(),
                    text: text.trim().to_string(),
                });
                SectionReport::say("Mensaje enviado.")
            }
            SectionAction::AddReminder { text } => {
                if blank(&text) {
                    return SectionReport::say("Por favor, ingresa el recordatorio.");
                }
                self.reminders.push(Reminder {
                    id: Uuid::new_v4(),
                    text: text.trim().to_string(),
                    completed: false,
                });
                SectionReport::say("Recordatorio añadido.")
            }
            SectionAction::RequestMedication { name, dosage, frequency } => {
                if blank(&name) || blank(&dosage) || blank(&frequency) {
                    return SectionReport::say(
                        "Por favor, completa todos los campos para la solicitud de medicamento.",
                    );
                }
                self.medication_requests.push(MedicationRequest {
                    name: name.trim().to_string(),
                    dosage: dosage.trim().to_string(),
                    frequency: frequency.trim().to_string(),
                    requested_on: today,
                });
                SectionReport::say("Solicitud de medicamento registrada.")
            }
            SectionAction::ScheduleAppointment { doctor, date, time } => {
                if blank(&doctor) || blank(&date) || blank(&time) {
                    return SectionReport::say("Por favor, completa todos los campos para la cita médica.");
                }
                self.appointments.push(Appointment {
                    id: Uuid::new_v4(),
                    doctor: doctor.trim().to_string(),
                    date: date.trim().to_string(),
                    time: time.trim().to_string(),
                });
                SectionReport::say("Cita médica agendada.")
            }
            // Calls are not wired to any telephony backend yet.
            SectionAction::CallContact { name } => SectionReport::say(format!("Llamando a {}...", name.trim())),
            SectionAction::CallEmergency => {
                SectionReport::say("Llamando a servicios de emergencia. Mantén la calma.")
            }
            SectionAction::FindNearbyHospitals => self.nearby_hospitals(),
        }
    }

    fn nearby_hospitals(&self) -> SectionReport {
        if self.hospitals.is_empty() {
            return SectionReport::navigate(
                SectionId::NearbyHospitals,
                "No se encontraron hospitales cercanos. Asegúrate de tener el GPS activado y de permitir el acceso a tu ubicación.",
            );
        }
        let list = self
            .hospitals
            .iter()
            .map(|h| format!("{} a {}", h.name, h.distance))
            .collect::<Vec<_>>()
            .join(", ");
        SectionReport::navigate(
            SectionId::NearbyHospitals,
            format!(
                "Los hospitales más cercanos son: {list}. Para una búsqueda precisa, permite el acceso a tu ubicación."
            ),
        )
    }
}

fn open_text(section: SectionId) -> &'static str {
    match section {
        SectionId::Home => "Volviendo a la página de inicio.",
        SectionId::VideoCalls => "Sección de videollamadas.",
        SectionId::Messages => "Sección de mensajes.",
        SectionId::Reminders => "Sección de recordatorios.",
        SectionId::Activities => "Sección de actividades.",
        SectionId::Emergency => "Activando servicios de emergencia.",
        SectionId::Recipes => "Sección de recetas. ¿Qué receta te gustaría encontrar?",
        SectionId::Medication => "Sección de solicitud de medicamentos.",
        SectionId::Appointments => "Sección de citas médicas.",
        SectionId::NearbyHospitals => "Buscando hospitales cercanos.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    #[test]
    fn blank_message_is_not_recorded() {
        let mut board = SectionBoard::new();
        let report = board.apply(
            SectionAction::SendMessage {
                recipient: "María".to_string(),
                text: "   ".to_string(),
            },
            today(),
        );
        assert_eq!(report.response, "Por favor, ingresa el destinatario y el mensaje.");
        assert!(board.messages().is_empty());
        assert_eq!(report.section, None);
    }

    #[test]
    fn medication_request_is_dated() {
        let mut board = SectionBoard::new();
        let report = board.apply(
            SectionAction::RequestMedication {
                name: "Paracetamol".to_string(),
                dosage: "500 mg".to_string(),
                frequency: "cada 8 horas".to_string(),
            },
            today(),
        );
        assert_eq!(report.response, "Solicitud de medicamento registrada.");
        assert_eq!(board.medication_requests()[0].requested_on, today());
    }

    #[test]
    fn hospitals_are_listed_with_distance() {
        let mut board = SectionBoard::new();
        let report = board.apply(SectionAction::FindNearbyHospitals, today());
        assert_eq!(report.section, Some(SectionId::NearbyHospitals));
        assert!(report.response.contains("Hospital Central a 2.5 km"));
    }

    #[test]
    fn opening_a_section_navigates() {
        let mut board = SectionBoard::new();
        let report = board.apply(SectionAction::Open(SectionId::Messages), today());
        assert_eq!(report, SectionReport::navigate(SectionId::Messages, "Sección de mensajes."));
    }
}
