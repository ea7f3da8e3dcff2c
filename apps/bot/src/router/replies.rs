//! Canned reply texts shared by the router and the pipeline.

pub const WELCOME: &str = "👋 Welcome to JobMatchBot!\n\n\
    I'll help you find jobs that match your profile. To get started:\n\
    1️⃣ Send me your resume as a PDF file\n\
    2️⃣ I'll ask you for job search preferences\n\
    3️⃣ I'll send you daily job matches with AI-powered match scores\n\n\
    Type /help anytime to see available commands.";

pub const HELP: &str = "🤖 *JobMatchBot Commands* 🤖\n\n\
    /start - Start or restart the bot\n\
    /preferences - Set all preferences at once\n\
    /keywords [job titles] - Set job search keywords\n\
    /location [place] - Set job search location\n\
    /score [number] - Set minimum match score\n\
    /time [HH:MM] - Set daily notification time\n\
    /jobs - Get jobs immediately\n\
    /analyze - Get resume analysis and improvement suggestions\n\
    /pause - Pause daily notifications\n\
    /resume - Resume daily notifications\n\
    /status - Check your current settings";

pub const RESUME_REQUEST: &str =
    "🚀 Please send your resume (as a PDF) so I can match jobs for you!";

pub const PREFERENCES_PROMPT: &str = "🔍 Let's customize your job search!\n\n\
    Please send your preferences in this format:\n\
    /preferences [job titles] | [location] | [minimum match %] | [notification time]\n\n\
    Example: /preferences Data Scientist, ML Engineer | New York | 75 | 08:00\n\n\
    Or you can set them individually:\n\
    /keywords Data Scientist, ML Engineer\n\
    /location New York\n\
    /score 75\n\
    /time 08:00";

pub const RESUME_SAVED: &str =
    "✅ Resume received! I'll start sending job matches based on your profile.";

pub const NO_NEW_JOBS: &str = "🔍 No new job matches found today. I'll keep searching!";
