//! Emails sent to applicants.
//!
//! Placeholders: `name`, `projectTitle`, `rejectionReason`, `appUrl`, `year`.

use crate::templates::Template;

const CENTER: &str = "Misurata Center for Entrepreneurship";
const SIGNATURE: &str = "Misurata Center for Entrepreneurship Team";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortalTemplate {
    CollaboratorSubmission,
    CollaboratorApproval,
    CollaboratorRejection,
    InnovatorSubmission,
    InnovatorApproval,
    InnovatorRejection,
}

impl PortalTemplate {
    pub const ALL: [PortalTemplate; 6] = [
        Self::CollaboratorSubmission,
        Self::CollaboratorApproval,
        Self::CollaboratorRejection,
        Self::InnovatorSubmission,
        Self::InnovatorApproval,
        Self::InnovatorRejection,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::CollaboratorSubmission => "collaborator_submission",
            Self::CollaboratorApproval => "collaborator_approval",
            Self::CollaboratorRejection => "collaborator_rejection",
            Self::InnovatorSubmission => "innovator_submission",
            Self::InnovatorApproval => "innovator_approval",
            Self::InnovatorRejection => "innovator_rejection",
        }
    }
}

pub(crate) fn portal_templates() -> Vec<Template> {
    vec![
        collaborator_submission(),
        collaborator_approval(),
        collaborator_rejection(),
        innovator_submission(),
        innovator_approval(),
        innovator_rejection(),
    ]
}

fn template(id: PortalTemplate, subject: String, heading: &str, text: String, html: &str) -> Template {
    Template {
        id: id.id().to_string(),
        subject: Some(subject),
        body: format!(
            "{text}\n\nBest regards,\n{SIGNATURE}\n\n\
             © {{{{year}}}} Misurata Center for Entrepreneurship & Business Incubators\n"
        ),
        html_body: Some(layout(heading, html)),
    }
}

fn layout(heading: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <div style="background: #1e3a8a; color: #fff; padding: 20px; text-align: center;">
        <h1>{heading}</h1>
      </div>
      <div style="padding: 20px; background: #f9fafb;">
{content}
        <p>Best regards,<br><strong>{SIGNATURE}</strong></p>
      </div>
      <div style="text-align: center; padding: 20px; color: #666; font-size: 12px;">
        <p>© {{{{year}}}} Misurata Center for Entrepreneurship &amp; Business Incubators</p>
      </div>
    </div>
  </body>
</html>
"#
    )
}

fn collaborator_submission() -> Template {
    template(
        PortalTemplate::CollaboratorSubmission,
        format!("Application Received - {CENTER}"),
        "Application Received",
        "Dear {{name}},\n\n\
         Thank you for applying to become a collaborator with the Misurata Center for \
         Entrepreneurship & Business Incubators.\n\n\
         Application status: Under Review\n\n\
         Our team will review your application within 3-5 business days and contact you \
         by email with the outcome."
            .to_string(),
        r#"        <p>Dear {{name}},</p>
        <p>Thank you for applying to become a collaborator with the Misurata Center for Entrepreneurship &amp; Business Incubators.</p>
        <p><strong>Application status:</strong> Under Review</p>
        <p>Our team will review your application within 3-5 business days and contact you by email with the outcome.</p>"#,
    )
}

fn collaborator_approval() -> Template {
    template(
        PortalTemplate::CollaboratorApproval,
        "🎉 Congratulations! Your Application Has Been Approved".to_string(),
        "Application Approved",
        "Dear {{name}},\n\n\
         We are pleased to inform you that your collaborator application has been APPROVED.\n\n\
         Your profile is now visible to our network: {{appUrl}}/collaborators\n\n\
         Our team will reach out shortly to discuss the next steps."
            .to_string(),
        r#"        <p>Dear {{name}},</p>
        <p>We are pleased to inform you that your collaborator application has been <strong>APPROVED</strong>.</p>
        <p>Your profile is now visible to our network.</p>
        <p style="text-align: center;"><a href="{{appUrl}}/collaborators">View Collaborators</a></p>
        <p>Our team will reach out shortly to discuss the next steps.</p>"#,
    )
}

fn collaborator_rejection() -> Template {
    template(
        PortalTemplate::CollaboratorRejection,
        format!("Application Update - {CENTER}"),
        "Application Update",
        "Dear {{name}},\n\n\
         Thank you for your interest in collaborating with the Misurata Center for \
         Entrepreneurship & Business Incubators. After careful review, we are unable to \
         approve your application at this time.\
         {{#if rejectionReason}}\n\nFeedback: {{rejectionReason}}{{/if}}\n\n\
         You are welcome to reapply once the points above have been addressed."
            .to_string(),
        r#"        <p>Dear {{name}},</p>
        <p>Thank you for your interest in collaborating with the Misurata Center for Entrepreneurship &amp; Business Incubators. After careful review, we are unable to approve your application at this time.</p>
        {{#if rejectionReason}}<div style="background: #fef3c7; padding: 15px; margin: 20px 0;"><strong>Feedback:</strong><br>{{rejectionReason}}</div>{{/if}}
        <p>You are welcome to reapply once the points above have been addressed.</p>"#,
    )
}

fn innovator_submission() -> Template {
    template(
        PortalTemplate::InnovatorSubmission,
        format!("Project Submission Received - {CENTER}"),
        "Project Submission Received",
        "Dear {{name}},\n\n\
         Thank you for submitting your project \"{{projectTitle}}\".\n\n\
         Project status: Under Review\n\n\
         Our expert panel will evaluate your submission within 5-7 business days and \
         contact you by email with the outcome."
            .to_string(),
        r#"        <p>Dear {{name}},</p>
        <p>Thank you for submitting your project "<strong>{{projectTitle}}</strong>".</p>
        <p><strong>Project status:</strong> Under Review</p>
        <p>Our expert panel will evaluate your submission within 5-7 business days and contact you by email with the outcome.</p>"#,
    )
}

fn innovator_approval() -> Template {
    template(
        PortalTemplate::InnovatorApproval,
        "🚀 Great News! Your Project Has Been Accepted".to_string(),
        "Project Accepted",
        "Dear {{name}},\n\n\
         Congratulations! Your project \"{{projectTitle}}\" has been ACCEPTED into our \
         innovation support program.\n\n\
         Your project is now featured in our innovators section: {{appUrl}}/innovators\n\n\
         Our team will contact you shortly to schedule an onboarding session."
            .to_string(),
        r#"        <p>Dear {{name}},</p>
        <p><strong>Congratulations!</strong> Your project "<strong>{{projectTitle}}</strong>" has been <strong>ACCEPTED</strong> into our innovation support program.</p>
        <p>Your project is now featured in our innovators section.</p>
        <p style="text-align: center;"><a href="{{appUrl}}/innovators">View Your Project</a></p>
        <p>Our team will contact you shortly to schedule an onboarding session.</p>"#,
    )
}

fn innovator_rejection() -> Template {
    template(
        PortalTemplate::InnovatorRejection,
        format!("Project Review Update - {CENTER}"),
        "Project Review Update",
        "Dear {{name}},\n\n\
         Thank you for submitting your project \"{{projectTitle}}\". After thorough \
         evaluation by our expert panel, we are unable to accept it into our current \
         incubation program.\
         {{#if rejectionReason}}\n\nFeedback from Review Panel: {{rejectionReason}}{{/if}}\n\n\
         You are welcome to reapply with an updated proposal."
            .to_string(),
        r#"        <p>Dear {{name}},</p>
        <p>Thank you for submitting your project "<strong>{{projectTitle}}</strong>". After thorough evaluation by our expert panel, we are unable to accept it into our current incubation program.</p>
        {{#if rejectionReason}}<div style="background: #fef3c7; padding: 15px; margin: 20px 0;"><strong>Feedback from Review Panel:</strong><br>{{rejectionReason}}</div>{{/if}}
        <p>You are welcome to reapply with an updated proposal.</p>"#,
    )
}
