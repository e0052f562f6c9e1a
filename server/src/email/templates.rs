//! Notification Templates
//!
//! Each [`EmailType`] renders a fixed subject and body from positional
//! parameters. Missing or blank positions fall back to a default.

use std::fmt;

/// Kind of notification email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailType {
    /// params: username
    Registration,
    /// params: sender, content
    DirectMessage,
    /// params: group name, sender, content
    GroupMessage,
    /// params: assignment title, student
    Submission,
    /// params: assignment title, grade, feedback
    SubmissionReview,
    /// params: new status, reason
    StatusChange,
    /// params: group name, assigned by
    GroupAssignment,
    /// params: group name, created by
    GroupCreated,
    /// params: reminder text
    Reminder,
}

impl EmailType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "REGISTRATION",
            Self::DirectMessage => "DIRECT_MESSAGE",
            Self::GroupMessage => "GROUP_MESSAGE",
            Self::Submission => "SUBMISSION",
            Self::SubmissionReview => "SUBMISSION_REVIEW",
            Self::StatusChange => "STATUS_CHANGE",
            Self::GroupAssignment => "GROUP_ASSIGNMENT",
            Self::GroupCreated => "GROUP_CREATED",
            Self::Reminder => "REMINDER",
        }
    }

    /// Render the subject line.
    pub fn subject(self, params: &[String]) -> String {
        match self {
            Self::Registration => "Welcome to Student Portal - Registration Successful".into(),
            Self::DirectMessage => format!("New Direct Message from {}", param(params, 0, "User")),
            Self::GroupMessage => format!("New Group Message in {}", param(params, 0, "Group")),
            Self::Submission => "Assignment Submission Received".into(),
            Self::SubmissionReview => "Your Submission Has Been Reviewed".into(),
            Self::StatusChange => "Account Status Updated".into(),
            Self::GroupAssignment => {
                format!("Assigned to New Group: {}", param(params, 0, "Group"))
            }
            Self::GroupCreated => format!("New Group Created: {}", param(params, 0, "Group")),
            Self::Reminder => format!("Reminder: {}", param(params, 0, "Important Notice")),
        }
    }

    /// Render the plain-text body.
    pub fn body(self, params: &[String]) -> String {
        let text = match self {
            Self::Registration => format!(
                "Dear {},\n\n\
                 Welcome to the Student Portal! Your account has been created.\n\n\
                 You can now open your dashboard, view assignments, submit work and \
                 talk to your group.\n\n\
                 Please log in to complete your profile.",
                param(params, 0, "User")
            ),
            Self::DirectMessage => format!(
                "{} sent you a direct message:\n\n\"{}\"\n\n\
                 Log in to the portal to read the whole conversation.",
                param(params, 0, "User"),
                param(params, 1, "You have a new message")
            ),
            Self::GroupMessage => format!(
                "New message in group \"{}\" from {}:\n\n\"{}\"\n\n\
                 Log in to the portal to join the discussion.",
                param(params, 0, "Group"),
                param(params, 1, "User"),
                param(params, 2, "New group message")
            ),
            Self::Submission => format!(
                "{} submitted work for \"{}\".\n\n\
                 Log in to the portal to review the submission.",
                param(params, 1, "Student"),
                param(params, 0, "Assignment")
            ),
            Self::SubmissionReview => format!(
                "Your submission for \"{}\" has been reviewed.\n\n\
                 Grade: {}\nFeedback: {}\n\n\
                 Log in to the portal for details.",
                param(params, 0, "Assignment"),
                param(params, 1, "N/A"),
                param(params, 2, "No feedback provided")
            ),
            Self::StatusChange => format!(
                "Your account status is now: {}\n\nReason: {}\n\n\
                 Contact your administrator if you have questions.",
                param(params, 0, "Updated"),
                param(params, 1, "Administrative update")
            ),
            Self::GroupAssignment => format!(
                "You have been added to the group: {}\n\nAssigned by: {}\n\n\
                 Log in to the portal to meet your group.",
                param(params, 0, "Group"),
                param(params, 1, "Administrator")
            ),
            Self::GroupCreated => format!(
                "A new group \"{}\" was created by {}.\n\n\
                 Log in to the portal to see its members.",
                param(params, 0, "Group"),
                param(params, 1, "Administrator")
            ),
            Self::Reminder => format!(
                "Reminder: {}\n\nLog in to the portal to take action.",
                param(params, 0, "You have pending items in the portal")
            ),
        };
        format!("{text}\n\nBest regards,\nStudent Portal Team\n")
    }
}

impl fmt::Display for EmailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn param<'a>(params: &'a [String], index: usize, default: &'a str) -> &'a str {
    params
        .get(index)
        .map(String::as_str)
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_subject_uses_first_param() {
        assert_eq!(
            EmailType::DirectMessage.subject(&params(&["alice"])),
            "New Direct Message from alice"
        );
        assert_eq!(
            EmailType::GroupAssignment.subject(&params(&["Cohort1"])),
            "Assigned to New Group: Cohort1"
        );
    }

    #[test]
    fn test_subject_defaults() {
        assert_eq!(
            EmailType::Reminder.subject(&[]),
            "Reminder: Important Notice"
        );
        assert_eq!(
            EmailType::GroupMessage.subject(&params(&["  "])),
            "New Group Message in Group"
        );
        assert_eq!(
            EmailType::Registration.subject(&params(&["ignored"])),
            "Welcome to Student Portal - Registration Successful"
        );
    }

    #[test]
    fn test_review_body_defaults() {
        let body = EmailType::SubmissionReview.body(&params(&["Essay"]));
        assert!(body.contains("\"Essay\""));
        assert!(body.contains("Grade: N/A"));
        assert!(body.contains("Feedback: No feedback provided"));
    }

    #[test]
    fn test_group_message_body_positions() {
        let body = EmailType::GroupMessage.body(&params(&["Cohort1", "alice", "hello"]));
        assert!(body.contains("group \"Cohort1\" from alice"));
        assert!(body.contains("\"hello\""));
    }

    #[test]
    fn test_every_body_is_signed() {
        for kind in [
            EmailType::Registration,
            EmailType::DirectMessage,
            EmailType::GroupMessage,
            EmailType::Submission,
            EmailType::SubmissionReview,
            EmailType::StatusChange,
            EmailType::GroupAssignment,
            EmailType::GroupCreated,
            EmailType::Reminder,
        ] {
            assert!(
                kind.body(&[]).ends_with("Best regards,\nStudent Portal Team\n"),
                "{kind} body is not signed"
            );
        }
    }
}
