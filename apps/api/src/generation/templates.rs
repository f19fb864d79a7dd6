// Cover letter templates, one per style.
// Slots are `{name}` placeholders filled by `generator::render_template` in a
// single pass. Block slots (`{achievements}`, `{custom_message}`, ...) may
// render empty; the generator collapses the blank lines they leave behind.

/// Replace: {greeting}, {role}, {company}, {company_possessive}, {experience},
///          {degree}, {skills}, {roles}, {achievements}, {attraction_reason},
///          {custom_message}, {name}, {email}, {phone}, {links}
pub const PROFESSIONAL_TEMPLATE: &str = r#"{greeting}

I am writing to express my strong interest in {role} at {company}. With {experience} of experience in the field and my {degree}, I am confident that my background aligns well with your requirements.

Throughout my career, I have developed expertise in {skills}, which directly relates to the qualifications you are seeking. {roles}I have consistently demonstrated my ability to deliver results and drive innovation.

{achievements}

What particularly attracts me to {company} is {attraction_reason}. I am excited about the opportunity to contribute to your team and help drive {company_possessive} continued success.

{custom_message}

Thank you for considering my application. I look forward to discussing how my skills and experience can benefit {company}.

Sincerely,
{name}
{email}
{phone}
{links}"#;

/// Replace: {greeting}, {name}, {role}, {company}, {attraction_reason},
///          {experience}, {top_skills}, {degree}, {skills}, {roles},
///          {achievements}, {custom_message}, {email}, {phone}, {links}
pub const CREATIVE_TEMPLATE: &str = r#"{greeting}

I'm {name}, and I'm thrilled about {role} at {company}!

Your job posting caught my attention because of {attraction_reason}. With {experience} of experience and a passion for {top_skills}, I believe I can bring fresh perspectives and inventive solutions to your team.

Here's what I bring to the table:
• {degree} with hands-on experience in {skills}
{roles}{achievements}
I'm not just looking for any job. I'm looking for the right opportunity to make a meaningful impact, and I believe {company} offers exactly that kind of environment where ideas meet execution.

{custom_message}

I'd love to chat more about how we can create something amazing together!

Best regards,
{name}
{email} | {phone}
{links}"#;

/// Replace: {greeting}, {role}, {experience}, {skills}, {roles},
///          {achievements}, {company}, {attraction_reason}, {custom_message},
///          {name}, {email}, {links}
pub const TECHNICAL_TEMPLATE: &str = r#"{greeting}

I am applying for {role} with {experience} of specialized experience in software development and technical problem-solving.

Technical Expertise:
{skills}

{roles}

{achievements}

I am particularly interested in {company} because of {attraction_reason}. Your technical challenges align closely with my experience and career goals.

{custom_message}

I would welcome the opportunity to discuss the technical aspects of this role in detail.

Best regards,
{name}
Technical Contact: {email}
{links}"#;
